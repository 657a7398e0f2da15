use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nalgebra::{UnitQuaternion, Vector3};
use serde::Deserialize;

use swsensor_hal::derived::GRAVITY_EARTH;
use swsensor_hal::{Clock, HalConfig, ManualClock, SensorBaseData, SensorHub, SensorType};

#[derive(Parser, Debug)]
#[command(name = "swsensor_replay")]
#[command(about = "Replay accel+gyro fusion samples through the software sensors", long_about = None)]
struct Args {
    /// JSON-lines file of {timestamp, pollrate_ns, processed[]} records
    #[arg(long, conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Generate this many synthetic samples (slow yaw rotation) instead
    #[arg(long)]
    synthetic: Option<usize>,

    /// Producer rate for synthetic samples
    #[arg(long, default_value = "100")]
    rate_hz: u32,

    /// HAL configuration JSON (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampling period requested for every software sensor, ns
    #[arg(long)]
    delay_ns: Option<i64>,
}

#[derive(Deserialize)]
struct FusionRecord {
    timestamp: i64,
    pollrate_ns: i64,
    processed: Vec<f32>,
}

fn load_records(path: &PathBuf) -> Result<Vec<SensorBaseData>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut samples = Vec::new();

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FusionRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", path.display(), line_no + 1))?;
        samples.push(SensorBaseData::from_processed(
            &record.processed,
            record.timestamp,
            record.pollrate_ns,
        )?);
    }

    Ok(samples)
}

fn synthetic_samples(count: usize, rate_hz: u32) -> Vec<SensorBaseData> {
    let period_ns = 1_000_000_000 / i64::from(rate_hz.max(1));
    let yaw_rate = 0.5f32; // rad/s

    (0..count)
        .map(|i| {
            let t = i as f32 * period_ns as f32 / 1e9;
            let orientation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw_rate * t);
            let gravity = orientation.inverse_transform_vector(&Vector3::new(0.0, 0.0, GRAVITY_EARTH));
            let linear = [0.2 * (t * 2.0).sin(), 0.0, 0.0];

            SensorBaseData::new((i as i64 + 1) * period_ns, period_ns)
                .with_quaternion(&orientation)
                .with_gravity([gravity.x, gravity.y, gravity.z])
                .with_linear_acceleration(linear)
        })
        .collect()
}

fn main() -> Result<()> {
    swsensor_hal::init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => HalConfig::load(path)?,
        None => HalConfig::default(),
    };

    let samples = match (&args.input, args.synthetic) {
        (Some(path), _) => load_records(path)?,
        (None, Some(count)) => synthetic_samples(count, args.rate_hz),
        (None, None) => bail!("either --input or --synthetic is required"),
    };

    // Replayed timestamps start near zero, so enable at t=0
    let clock = Arc::new(ManualClock::new(0));
    let mut hub = SensorHub::from_config(&config, clock.clone())?;
    let handles: Vec<i32> = config.sensors.iter().map(|s| s.handle).collect();
    for &handle in &handles {
        if let Some(delay) = args.delay_ns {
            hub.set_delay(handle, delay)?;
        }
        hub.set_enable(handle, true)?;
    }

    let reader = hub.reader();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut written = 0usize;

    for sample in &samples {
        clock.set(sample.timestamp);
        hub.deliver(SensorType::AccelGyroFusion6X, sample);

        for event in reader.poll(usize::MAX) {
            serde_json::to_writer(&mut out, &event)?;
            out.write_all(b"\n")?;
            written += 1;
        }
    }
    out.flush()?;

    log::info!(
        "Replayed {} samples, wrote {} events (clock at {} ns)",
        samples.len(),
        written,
        clock.now_ns()
    );
    for handle in handles {
        let stats = hub.stats(handle)?;
        log::info!(
            "  handle {}: processed {}, delivered {}, decimated {}, dropped {}",
            handle,
            stats.processed,
            stats.delivered,
            stats.decimated,
            stats.dropped
        );
    }

    Ok(())
}
