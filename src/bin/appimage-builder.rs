use std::path::Path;

use anyhow::Result;
use appimage_builder::build_appimage;
use appimage_builder::runtime;

fn usage() -> &'static str {
    "Usage:\n  appimage-builder SOURCE DESTINATION"
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [source, destination] => build_appimage(
            Path::new(source),
            Path::new(destination),
            &runtime::runtime_path(),
        ),
        _ => {
            eprintln!("{}", usage());
            std::process::exit(1);
        }
    }
}
