use clap::Parser;
use sense_edge_rs::{
    acquisition::{audio::list_input_devices, AudioSource, CpalAudioSource, CpalSourceConfig, SyntheticMotionSource},
    config::load_config,
    error::Result as EdgeResult,
    pause_gate::PauseGate,
    pipeline::TelemetrySink,
    renderer::WaveformRenderer,
    session::CaptureSession,
    stream_buffer::StreamBuffer,
    transport::{MqttTransport, TelemetryPublisher},
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "sense-edge", about = "Motion and audio telemetry edge client")]
struct Args {
    /// MQTT broker host (overrides MQTT_HOST)
    #[arg(long)]
    host: Option<String>,

    /// MQTT broker port (overrides MQTT_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Audio input device name substring (overrides AUDIO_DEVICE)
    #[arg(long)]
    device: Option<String>,

    /// List available audio input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Start with capture paused
    #[arg(long)]
    paused: bool,
}

#[tokio::main]
async fn main() -> EdgeResult<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_devices {
        for name in list_input_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut config = load_config().map_err(|e| {
        sense_edge_rs::TelemetryError::Config(e.to_string())
    })?;
    if let Some(host) = args.host {
        config.mqtt.host = host;
    }
    if let Some(port) = args.port {
        config.mqtt.port = port;
    }
    if let Some(device) = args.device {
        config.capture.audio_device_name = Some(device);
    }

    log::info!("Starting sense-edge");

    let transport = Arc::new(MqttTransport::connect(&config.mqtt)?);

    let gate = PauseGate::new();
    gate.set_paused(args.paused);

    let buffer = Arc::new(StreamBuffer::new(gate.clone())?);
    let sink = Arc::new(TelemetrySink::new(
        transport.clone(),
        gate.clone(),
        config.mqtt.motion_topic.clone(),
        config.mqtt.audio_topic.clone(),
    ));
    let session = CaptureSession::new(Arc::clone(&buffer), sink, gate);

    // Desktop hosts have no accelerometer; a synthetic source stands in for
    // the platform sensor feed.
    let motion_source = Box::new(SyntheticMotionSource::new(config.capture.motion_interval_ms));
    let audio_config = CpalSourceConfig {
        sample_rate: config.capture.audio_sample_rate,
        device_name: config.capture.audio_device_name.clone(),
    };
    session.start(
        motion_source,
        Box::new(move || {
            CpalAudioSource::open(audio_config).map(|s| Box::new(s) as Box<dyn AudioSource>)
        }),
    )?;

    println!("Streaming telemetry to {}:{}", config.mqtt.host, config.mqtt.port);
    println!("Press Ctrl+C to exit");

    let renderer = WaveformRenderer::new();
    let mut redraw = tokio::time::interval(Duration::from_millis(500));

    loop {
        tokio::select! {
            _ = redraw.tick() => {
                // The display collaborator would consume these polylines;
                // here the tick just exercises the render path and reports
                // buffer occupancy.
                let (x, y, z) = buffer.motion_snapshot();
                let audio = buffer.audio_snapshot();
                let motion_lines = renderer.render_motion(&x, &y, &z, 800.0, 400.0);
                let audio_line = renderer.render_audio(&audio, 800.0, 400.0);
                log::debug!(
                    "render tick: {} motion points/channel, {} audio points, connected={}",
                    motion_lines[0].len(),
                    audio_line.len(),
                    transport.is_connected()
                );
            }

            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    session.stop();
    transport.disconnect();
    println!("Session ended");
    Ok(())
}
