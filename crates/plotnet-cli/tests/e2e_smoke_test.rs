use std::{fs, path::PathBuf};

use log::LevelFilter;
use tempfile::tempdir;

use plotnet_cli::{Args, run};

/// Collects all .toml files from a directory
fn collect_toml_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn demos_path() -> PathBuf {
    // Demos are at workspace root, relative to workspace not the crate
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args(input: PathBuf, output: PathBuf) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: Some(output.to_string_lossy().to_string()),
        compile: false,
        keep_temp: false,
        open: false,
        config: None,
        log_level: LevelFilter::Off,
    }
}

#[test]
fn e2e_smoke_test_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let demos = collect_toml_files(demos_path());
    assert!(!demos.is_empty(), "No demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &demos {
        let output_filename = format!("{}.tex", demo_path.file_stem().unwrap().to_string_lossy());
        let output_path = temp_dir.path().join(output_filename);

        match run(&args(demo_path.clone(), output_path.clone())) {
            Ok(()) => {
                let tex = fs::read_to_string(&output_path).unwrap();
                assert!(tex.contains("\\begin{tikzpicture}"));
                assert!(tex.contains("\\end{document}"));
            }
            Err(e) => failed_demos.push((demo_path.clone(), e)),
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo(s) failed unexpectedly", failed_demos.len());
    }

    println!("All {} demos passed", demos.len());
}

#[test]
fn e2e_invalid_architecture_fails() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("broken.toml");
    let output = temp_dir.path().join("broken.tex");
    fs::write(&input, "[[layer]]\nkind = \"conv\"\nname = \"stem\"\n").unwrap();

    assert!(run(&args(input, output.clone())).is_err());
    assert!(!output.exists(), "Nothing is written for a failing architecture");
}

#[test]
fn e2e_project_config_beside_input() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("net.toml");
    let output = temp_dir.path().join("net.tex");
    fs::write(&input, "[[layer]]\nkind = \"conv\"\nname = \"conv_1\"\nprev = \"origin\"\n").unwrap();
    fs::write(
        temp_dir.path().join(plotnet_cli::PROJECT_CONFIG),
        "[document]\nlayers_path = \"/opt/plotnet\"\n",
    )
    .unwrap();

    run(&args(input, output.clone())).unwrap();
    let tex = fs::read_to_string(&output).unwrap();
    assert!(tex.contains("\\subimport{/opt/plotnet/layers/}{init}"));
}

#[test]
fn e2e_invalid_project_config_fails() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("net.toml");
    let output = temp_dir.path().join("net.tex");
    fs::write(&input, "[[layer]]\nkind = \"legend\"\n").unwrap();
    fs::write(
        temp_dir.path().join(plotnet_cli::PROJECT_CONFIG),
        "[compiler]\nclean_extensions = [\"pdf\"]\n",
    )
    .unwrap();

    let err = run(&args(input, output.clone())).unwrap_err();
    assert!(matches!(err, plotnet::PlotnetError::Config(_)));
    assert!(!output.exists());
}

#[test]
fn e2e_missing_input_fails() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("absent.toml");
    let output = temp_dir.path().join("absent.tex");
    assert!(run(&args(input, output)).is_err());
}

#[cfg(unix)]
#[test]
fn e2e_compile_with_configured_program() {
    let temp_dir = tempdir().unwrap();
    let config = temp_dir.path().join("config.toml");
    fs::write(
        &config,
        "[compiler]\nprogram = \"sh\"\nargs = [\"-c\", \"touch \\\"${1%.tex}.pdf\\\" \\\"${1%.tex}.aux\\\"\", \"sh\"]\n",
    )
    .unwrap();

    let output = temp_dir.path().join("alexnet.tex");
    let mut args = args(demos_path().join("alexnet.toml"), output);
    args.compile = true;
    args.config = Some(config.to_string_lossy().to_string());

    run(&args).unwrap();
    assert!(temp_dir.path().join("alexnet.pdf").exists());
    assert!(!temp_dir.path().join("alexnet.aux").exists());

    args.keep_temp = true;
    run(&args).unwrap();
    assert!(temp_dir.path().join("alexnet.aux").exists());
}
