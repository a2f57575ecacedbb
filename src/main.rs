//! libp2p Peer ID Vanity Generator CLI
//!
//! Usage:
//!   peer_vanity --fast --suff abc,xyz          # Search for a peer ID ending in "abc" or "xyz"
//!   peer_vanity --fast --suff abc --timeout 1h # Give up after an hour
//!   peer_vanity --type secp256k1 > id.key      # Generate a single key
//!   peer_vanity --key id.key                   # Print the peer ID of a key file

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use peer_vanity::config::Mode;
use peer_vanity::{
    CancellationToken, Config, FileSink, KeyType, Keypair, PeerKeyGenerator, SearchCoordinator,
    SearchError, VanityMatch,
};

fn main() {
    init_logging();

    let config = Config::parse();

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let outcome = match config.mode() {
        Mode::Search => search(&config),
        Mode::Inspect(path) => read_key(&path, config.key_type),
        Mode::Generate => generate_key(config.effective_key_type()),
    };

    if let Err(e) = outcome {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn search(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let generator = PeerKeyGenerator::new(config.effective_key_type());
    let sink = FileSink::new(&config.output);
    let coordinator = SearchCoordinator::new(config.search_config()?, generator, sink.clone());

    let search_config = coordinator.config();
    println!("libp2p Peer ID Vanity Generator");
    println!("===============================");
    println!("Suffixes:   {}", search_config.suffixes());
    println!("Difficulty: {}", search_config.suffixes().difficulty_description());
    println!("Key type:   {}", generator.key_type());
    println!("Workers:    {}", search_config.worker_count());
    println!("Timeout:    {:?}", search_config.timeout());
    println!();

    let token = CancellationToken::new();
    ctrlc_handler(token.clone());

    println!("Searching... (Press Ctrl+C to stop)\n");

    let result = coordinator.run_with_token(token);
    println!("Keys generated: {}", coordinator.stats().total_attempts());

    match result {
        Ok(found) => {
            print_result(&found, &sink);
            Ok(())
        }
        Err(SearchError::Cancelled) => {
            println!("\nStopped by user.");
            Err(SearchError::Cancelled.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_result(found: &VanityMatch, sink: &FileSink) {
    let output = sink.path();
    match Keypair::from_protobuf(&found.key_material) {
        Ok(keypair) => println!("ID for generated key: {}", keypair.peer_id()),
        Err(e) => eprintln!("Could not decode winning key: {}", e),
    }
    println!("PKey(base36): {}", found.canonical_string);
    println!("Worker:       {}", found.worker_id);

    if found.persisted {
        println!("Private key appended to {}", output.display());
    } else {
        eprintln!(
            "Warning: the private key could not be written to {}; it may be missing on disk",
            output.display()
        );
        eprintln!("Private key (hex): {}", hex::encode(&found.key_material));
    }

    println!("\nFound: {}", found.canonical_string);
}

/// Decodes a key file. With an explicit key type the file holds raw key bytes,
/// otherwise a marshalled protobuf key.
fn read_key(path: &Path, key_type: Option<KeyType>) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(path)?;
    eprintln!("Reading key at: {}", path.display());

    let keypair = match key_type {
        Some(key_type) => Keypair::from_raw(key_type, &data)?,
        None => Keypair::from_protobuf(&data)?,
    };

    eprintln!(
        "Success!\nID for {} key: {}\nPrivate key (hex): {}",
        keypair.key_type(),
        keypair.peer_id(),
        hex::encode(&data)
    );
    Ok(())
}

/// Generates one key, writing the marshalled key to stdout.
fn generate_key(key_type: KeyType) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Generating a {} key...", key_type);

    let keypair = Keypair::generate(key_type);
    let data = keypair.to_protobuf();

    let mut stdout = io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;

    eprintln!(
        "Success!\nID for generated key: {}\nPrivate key (hex): {}",
        keypair.peer_id(),
        hex::encode(&data)
    );
    Ok(())
}

fn ctrlc_handler(token: CancellationToken) {
    ctrlc::set_handler(move || {
        token.cancel();
    })
    .expect("Error setting Ctrl-C handler");
}
