//! svc_decode - decode captured services lookup responses
//!
//! Membaca response mentah (envelope + record) dari file dan men-decode-nya
//! ke buffer dengan ukuran tertentu, persis seperti NSS client.
//!
//! Usage:
//!   cargo run --bin svc_decode -- [OPTIONS] <FILE>

use std::fs;
use std::process;

use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use nss_svc::protocol::{decode_response, Decoded};
use nss_svc::LookupConfig;

/// Growth stops here; a record needing more is treated as hostile
const MAX_BUFLEN: usize = 64 * 1024 * 1024;

/// Tool configuration
struct DecodeConfig {
    path: Option<String>,
    buflen: usize,
    grow: bool,
    hex: bool,
    lookup: LookupConfig,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            path: None,
            buflen: 1024,
            grow: false,
            hex: false,
            lookup: LookupConfig::from_env(),
        }
    }
}

fn parse_args() -> DecodeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = DecodeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--buflen" | "-b" => {
                if i + 1 < args.len() {
                    config.buflen = args[i + 1].parse().unwrap_or(1024);
                    i += 1;
                }
            }
            "--grow" | "-g" => {
                config.grow = true;
            }
            "--hex" | "-x" => {
                config.hex = true;
            }
            "--strict" => {
                config.lookup = config.lookup.with_strict_trailing(true);
            }
            "--help" | "-h" => {
                println!("svc_decode - decode a captured services lookup response\n");
                println!("Usage: svc_decode [OPTIONS] <FILE>\n");
                println!("Options:");
                println!("  -b, --buflen <N>  Destination buffer size (default: 1024)");
                println!("  -g, --grow        Double the buffer on ERANGE until it fits");
                println!("  -x, --hex         Input file is hex text instead of raw bytes");
                println!("      --strict      Reject trailing bytes after the record");
                println!("  -h, --help        Show this help");
                process::exit(0);
            }
            other => {
                config.path = Some(other.to_string());
            }
        }
        i += 1;
    }

    config
}

/// Hex text with arbitrary whitespace (hexdump / xxd -p output).
fn decode_hex_text(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let digits: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    hex::decode(digits)
}

fn load(config: &DecodeConfig, path: &str) -> Result<Vec<u8>, String> {
    let bytes = fs::read(path).map_err(|e| format!("cannot read {}: {}", path, e))?;
    if !config.hex {
        return Ok(bytes);
    }
    let text = String::from_utf8(bytes).map_err(|_| format!("{} is not hex text", path))?;
    decode_hex_text(&text).map_err(|e| format!("{} is not hex text: {}", path, e))
}

fn run(config: DecodeConfig) -> Result<(), String> {
    let path = config.path.clone().ok_or("missing input file (see --help)")?;
    let raw = load(&config, &path)?;
    let mut buflen = config.buflen.clamp(1, MAX_BUFLEN);

    loop {
        let mut dest = vec![0u8; buflen];
        match decode_response(&raw, &mut dest, &config.lookup) {
            Ok(Decoded::NotFound) => {
                println!("not found");
                return Ok(());
            }
            Ok(Decoded::Found(entry)) => {
                println!("port:     {}", entry.port());
                println!("name:     {}", String::from_utf8_lossy(entry.name()));
                println!("protocol: {}", String::from_utf8_lossy(entry.protocol()));
                for (i, alias) in entry.aliases().enumerate() {
                    println!("alias[{}]: {}", i, String::from_utf8_lossy(alias));
                }
                println!("buffer:   {} bytes", buflen);
                return Ok(());
            }
            Err(e) if e.is_out_of_range() && config.grow => {
                debug!(buflen, error = %e, "growing destination buffer");
                buflen *= 2;
                if buflen > MAX_BUFLEN {
                    return Err(format!("{} (gave up at {} bytes)", e, MAX_BUFLEN));
                }
            }
            Err(e) => return Err(format!("{} (errno {})", e, e.errno())),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = parse_args();

    if let Err(e) = run(config) {
        error!("{}", e);
        process::exit(1);
    }
}
