//! Decode and re-encode saves, reporting whether the bytes survive unchanged
//!
//! ```text
//! msav-check world.msav backup.msav
//! world.msav: identical (1043221 bytes, version 2)
//! backup.msav: differs at byte 5512 (1043221 bytes in, 1043220 bytes out)
//! ```

use std::{error, process::ExitCode};

fn check(path: &str) -> Result<bool, Box<dyn error::Error>> {
    let compressed = std::fs::read(path)?;
    let data = msav::envelope::inflate(&compressed)?;
    let doc = msav::SaveDocument::decode(&data)?;
    let out = msav::EncodeOptions::new()
        .reserve(data.len())
        .encode(&doc)?;

    if out == data {
        println!("{}: identical ({} bytes, version {})", path, data.len(), doc.version);
        return Ok(true);
    }

    let at = data
        .iter()
        .zip(out.iter())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| data.len().min(out.len()));
    println!(
        "{}: differs at byte {} ({} bytes in, {} bytes out)",
        path,
        at,
        data.len(),
        out.len()
    );
    Ok(false)
}

fn main() -> ExitCode {
    env_logger::init();
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: msav-check <save>...");
        return ExitCode::from(2);
    }

    let mut success = true;
    for path in &paths {
        match check(path) {
            Ok(identical) => success &= identical,
            Err(e) => {
                eprintln!("{}: {}", path, e);
                success = false;
            }
        }
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
