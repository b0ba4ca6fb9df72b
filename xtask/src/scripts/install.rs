use crate::cli;
use color_eyre::eyre::{eyre, Result};
use duct::cmd;
use std::env;
use std::path::PathBuf;

fn default_install_dir() -> Result<PathBuf> {
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map_err(|_| eyre!("Could not determine home directory"))?;
    Ok(PathBuf::from(home).join(".local").join("bin"))
}

pub fn install(args: &cli::InstallArgs) -> Result<()> {
    println!("Building {} in release mode...", args.name);
    cmd!("cargo", "build", "--package", "hlsx", "--bin", &args.name, "--release").run()?;

    let install_dir = match &args.path {
        Some(path) => PathBuf::from(path),
        None => default_install_dir()?,
    };
    std::fs::create_dir_all(&install_dir)?;

    let source_path = PathBuf::from("target").join("release").join(&args.name);
    let dest_path = install_dir.join(&args.name);
    std::fs::copy(&source_path, &dest_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&dest_path, std::fs::Permissions::from_mode(0o755))?;
    }

    println!("Installed {} to {}", args.name, dest_path.display());

    let on_path = env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|p| p == install_dir))
        .unwrap_or(false);
    if !on_path {
        println!("Note: {} is not in your PATH.", install_dir.display());
    }

    Ok(())
}
