use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::error;

use mediahash_core::{process_task, HashMethod, HashTask, DEFAULT_BITS};

/// Compute perceptual hashes of image and video files.
#[derive(Parser)]
#[command(name = "mediahash", version, disable_version_flag = true)]
#[command(about = "Compute perceptual hashes of image and video files")]
struct Cli {
    /// Show program version information and exit
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Use the quick block mean hashing method
    #[arg(short, long)]
    quick: bool,

    /// Use the fixed 64-bit DCT hashing method
    #[arg(long)]
    dct: bool,

    /// Expect video files instead of image files
    #[arg(short = 'V', long)]
    video: bool,

    /// Hash grid size; the hash has BITS^2 bits
    #[arg(short, long, value_name = "BITS", default_value_t = DEFAULT_BITS, value_parser = parse_bits)]
    bits: u32,

    /// Print debugging information, including hashes as 2D grids
    #[arg(long)]
    debug: bool,

    /// Files to hash
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

/// Hash grid sizes must be positive multiples of 4.
fn parse_bits(arg: &str) -> Result<u32, String> {
    let bits: u32 = arg
        .parse()
        .map_err(|_| "couldn't parse bits argument".to_string())?;
    if bits == 0 || bits % 4 != 0 {
        return Err("bits argument should be a positive multiple of 4".to_string());
    }
    Ok(bits)
}

fn hash_file(cli: &Cli, file: &PathBuf) -> anyhow::Result<()> {
    let method = if cli.dct {
        HashMethod::Dct64
    } else if cli.quick {
        HashMethod::BlockMeanQuick
    } else {
        HashMethod::BlockMean
    };

    let task = HashTask::new(file.clone(), cli.bits, method, cli.debug, cli.video)
        .with_context(|| format!("invalid settings for '{}'", file.display()))?;
    let hash = process_task(&task)
        .with_context(|| format!("failed to hash '{}'", file.display()))?;

    if task.debug {
        if let Some(cells) = hash.as_bits() {
            print_bit_grid(cells, task.bits as usize);
        }
    }
    println!("{}  {}", hash.to_hex(), file.display());
    Ok(())
}

/// Print a hash as rows of 0/1 digits, one `bits` x `bits` block per
/// aggregated part.
fn print_bit_grid(cells: &[u8], bits: usize) {
    for (part, block) in cells.chunks(bits * bits).enumerate() {
        if part > 0 {
            println!();
        }
        for row in block.chunks(bits) {
            let line: String = row.iter().map(|&cell| char::from(b'0' + cell)).collect();
            println!("{line}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.debug { "debug" } else { "warn" }),
    )
    .init();

    let mut failed = 0usize;
    for file in &cli.files {
        if let Err(e) = hash_file(&cli, file) {
            error!("{e:#}");
            failed += 1;
        }
    }

    if failed > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bits_not_a_multiple_of_four() {
        assert!(Cli::try_parse_from(["mediahash", "--bits", "15", "a.png"]).is_err());
        assert!(Cli::try_parse_from(["mediahash", "--bits", "0", "a.png"]).is_err());
    }

    #[test]
    fn accepts_valid_bits() {
        let cli = Cli::try_parse_from(["mediahash", "-b", "8", "a.png"]).unwrap();
        assert_eq!(cli.bits, 8);
    }

    #[test]
    fn defaults_to_sixteen_bits() {
        let cli = Cli::try_parse_from(["mediahash", "a.png"]).unwrap();
        assert_eq!(cli.bits, DEFAULT_BITS);
        assert!(!cli.quick && !cli.video && !cli.dct && !cli.debug);
    }

    #[test]
    fn requires_at_least_one_file() {
        assert!(Cli::try_parse_from(["mediahash"]).is_err());
        assert!(Cli::try_parse_from(["mediahash", "--quick"]).is_err());
    }

    #[test]
    fn capital_v_selects_video() {
        let cli = Cli::try_parse_from(["mediahash", "-V", "clip.mp4"]).unwrap();
        assert!(cli.video);
    }
}
