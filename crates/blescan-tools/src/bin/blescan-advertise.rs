use blescan_client::Scanner;
use blescan_core::beacons::eddystone::EddystoneFrame;
use blescan_datalink::ReplayTransport;
use blescan_tools::hex_line;
use clap::Parser;

/// Print the HCI commands that make a controller advertise as an
/// Eddystone beacon, one hex frame per line.
#[derive(Parser, Debug)]
#[command(name = "blescan-advertise")]
struct Args {
    /// URL to broadcast.
    #[arg(short, long, conflicts_with_all = ["namespace", "instance"])]
    url: Option<String>,
    /// 10-byte UID namespace, as hex.
    #[arg(long, requires = "instance")]
    namespace: Option<String>,
    /// 6-byte UID instance, as hex.
    #[arg(long, requires = "namespace")]
    instance: Option<String>,
    /// Calibrated power at 0 m, in dBm.
    #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
    txpower: i8,
    /// Interval between advertisements in milliseconds.
    #[arg(short, long, default_value_t = 100.0)]
    advertise: f64,
    /// Only print the command that stops advertising.
    #[arg(long)]
    stop: bool,
    #[arg(long)]
    json: bool,
}

const DEFAULT_URL: &str = "https://goo.gl/m9UiEA";

fn parse_id<const N: usize>(what: &str, text: &str) -> Result<[u8; N], Box<dyn std::error::Error>> {
    let bytes = hex::decode(text.replace([':', ' '], ""))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("{what} must be {N} bytes, got {}", b.len()).into())
}

fn frame(args: &Args) -> Result<EddystoneFrame, Box<dyn std::error::Error>> {
    if let (Some(namespace), Some(instance)) = (&args.namespace, &args.instance) {
        return Ok(EddystoneFrame::Uid {
            tx_power: args.txpower,
            namespace: parse_id("namespace", namespace)?,
            instance: parse_id("instance", instance)?,
        });
    }
    Ok(EddystoneFrame::Url {
        tx_power: args.txpower,
        url: args.url.clone().unwrap_or_else(|| DEFAULT_URL.to_owned()),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    // Nothing is read back; the replay transport just collects the frames.
    let scanner = Scanner::new(ReplayTransport::new(tokio::io::empty()));
    if args.stop {
        scanner.stop_advertising().await?;
    } else {
        scanner
            .advertise_eddystone(&frame(&args)?, args.advertise)
            .await?;
    }

    let lines: Vec<String> = scanner
        .transport()
        .sent()
        .await
        .iter()
        .map(|f| hex_line(f))
        .collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for line in lines {
            println!("{line}");
        }
    }
    Ok(())
}
