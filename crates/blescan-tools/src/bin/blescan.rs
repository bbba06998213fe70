use blescan_client::{
    create_beacon_listener, ListenerConfig, Scanner, ScannerConfig, Sighting,
};
use blescan_core::types::MacAddress;
use blescan_datalink::{CapturingTransport, HciTransport, ReplayTransport};
use blescan_tools::{hex_line, summary, FormatArgs, TrailingByteArg};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

/// Decode recorded HCI event frames and report the beacons in them.
#[derive(Parser, Debug)]
#[command(name = "blescan")]
struct Args {
    /// Hex frame file, one frame per line. Reads stdin when omitted.
    input: Option<PathBuf>,
    /// Only report these advertisers (repeatable).
    #[arg(short, long)]
    mac: Vec<MacAddress>,
    #[command(flatten)]
    formats: FormatArgs,
    /// Also print the decoded tree of events no selected format claims.
    #[arg(short = 'R', long)]
    raw: bool,
    #[arg(long)]
    json: bool,
    /// Write every frame sent and received to this PCAP file.
    #[arg(long)]
    pcap: Option<PathBuf>,
    /// Request active scanning (scan responses) instead of passive.
    #[arg(long)]
    active: bool,
    #[arg(long, default_value_t = 10.0)]
    interval_ms: f64,
    #[arg(long, default_value_t = 750.0)]
    window_ms: f64,
    #[arg(long, value_enum, default_value_t = TrailingByteArg::Rssi)]
    trailing_byte: TrailingByteArg,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match (&args.input, &args.pcap) {
        (Some(path), None) => run(ReplayTransport::open(path).await?, &args).await,
        (Some(path), Some(pcap)) => {
            let replay = ReplayTransport::open(path).await?;
            run(CapturingTransport::to_file(replay, pcap)?, &args).await
        }
        (None, None) => run(stdin_replay(), &args).await,
        (None, Some(pcap)) => run(CapturingTransport::to_file(stdin_replay(), pcap)?, &args).await,
    }
}

fn stdin_replay() -> ReplayTransport<BufReader<tokio::io::Stdin>> {
    ReplayTransport::new(BufReader::new(tokio::io::stdin()))
}

async fn run<T: HciTransport + 'static>(
    transport: T,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let transport = Arc::new(transport);
    let policy = args.trailing_byte.into_policy();

    let mut scanner_config = ScannerConfig {
        filter_duplicates: false,
        trailing_byte: policy,
        ..ScannerConfig::default()
    };
    scanner_config.scan.interval_ms = args.interval_ms;
    scanner_config.scan.window_ms = args.window_ms;
    if args.active {
        scanner_config.scan.scan_type = blescan_core::hci::ScanType::Active;
    }
    let scanner = Scanner::with_config(Arc::clone(&transport), &scanner_config);
    scanner
        .start_scan(&scanner_config.scan, scanner_config.filter_duplicates)
        .await?;

    let kinds = args.formats.kinds();
    let config = ListenerConfig {
        macs: args.mac.clone(),
        trailing_byte: policy,
        expand_eddystone: true,
        include_unrecognized: args.raw,
        ..ListenerConfig::default().with_kinds(kinds)
    };
    let (mut listener, driver) = create_beacon_listener(transport, config);
    let json = args.json;
    let printer = async move {
        while let Some(sighting) = listener.recv().await {
            report(&sighting, json)?;
        }
        Ok::<_, serde_json::Error>(())
    };
    let ((), printed) = tokio::join!(driver, printer);
    printed?;

    scanner.stop_scan().await?;
    Ok(())
}

fn report(sighting: &Sighting, json: bool) -> Result<(), serde_json::Error> {
    match sighting {
        Sighting::Beacon(record) if json => println!("{}", serde_json::to_string(record)?),
        Sighting::Beacon(record) => println!("{}", summary(record)),
        Sighting::Malformed { reason, event } => {
            log::warn!("malformed advertisement: {reason}");
            if !json {
                print!("{}", event.display(0));
            }
        }
        Sighting::Raw(event) if json => match event.to_vec() {
            Ok(bytes) => println!("{}", serde_json::json!({ "raw": hex_line(&bytes) })),
            Err(e) => log::warn!("cannot re-encode event: {e}"),
        },
        Sighting::Raw(event) => print!("{}", event.display(0)),
    }
    Ok(())
}
