//! Print a save as pretty JSON
//!
//! Reads the compressed save given as the first argument, or stdin when no
//! path is given. Pass `--raw` for a save that has already been inflated.

use std::{
    error,
    io::{self, BufWriter, Read, Write},
};

fn main() -> Result<(), Box<dyn error::Error>> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let raw = args.iter().any(|x| x == "--raw");
    let path = args.iter().find(|x| !x.starts_with("--"));

    let data = match path {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut data = Vec::new();
            io::stdin().lock().read_to_end(&mut data)?;
            data
        }
    };

    let doc = if raw {
        msav::SaveDocument::decode(&data)?
    } else {
        msav::SaveDocument::from_compressed(&data)?
    };

    let stdout = io::stdout().lock();
    let mut writer = BufWriter::new(stdout);
    serde_json::to_writer_pretty(&mut writer, &doc)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
