//! Simulated recording example.
//!
//! Drives a full recording with synthetic samples from the mock capture
//! source, then reads the produced container back.
//!
//! Run with: RUST_LOG=screen_recorder=debug cargo run --example simulated_recording

use std::time::Duration;

use screen_recorder::{
    probe, DisplayGeometry, MediaSample, MediaTime, MockCaptureSource, RecorderConfig,
    ScreenRecorder, StartOptions, TrackKind,
};
use tracing_subscriber::EnvFilter;

const FRAME_INTERVAL_MS: i64 = 33;
const AUDIO_INTERVAL_MS: i64 = 20;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let source = MockCaptureSource::new().with_display(DisplayGeometry::new(1280, 720, 2.0));
    let config = RecorderConfig {
        output_dir: std::env::temp_dir().join("screen-recorder-demo"),
        ..Default::default()
    };

    let recorder = ScreenRecorder::builder(source.clone())
        .with_config(config)
        .on_event(|e| tracing::info!(?e, "recorder event"))
        .build();

    println!("Recording 2 seconds of synthetic screen and microphone samples...");
    recorder
        .start(StartOptions {
            mic: true,
            app_audio: false,
            fps: Some(30),
        })
        .await?;

    // Simulated capture clock, starting at an arbitrary host time.
    let base = 5_000;
    let mut dropped = 0;
    for tick in 0..100 {
        let now = base + tick * AUDIO_INTERVAL_MS;
        if tick * AUDIO_INTERVAL_MS % FRAME_INTERVAL_MS < AUDIO_INTERVAL_MS
            && !source.push(MediaSample::video(MediaTime::from_millis(now), vec![0x10; 4096]))
        {
            dropped += 1;
        }
        if !source.push(MediaSample::mic_audio(MediaTime::from_millis(now), vec![0x01; 1764])) {
            dropped += 1;
        }
        tokio::time::sleep(Duration::from_millis(AUDIO_INTERVAL_MS as u64)).await;
    }

    let summary = recorder.stop().await?;
    println!("Recording saved to {}", summary.uri);
    println!("Duration: {:.2}s, dropped samples: {dropped}", summary.duration_seconds);

    let container = probe(&summary.path)?;
    for track in &container.tracks {
        println!(
            "  {:<9} {:>4} packets, {:>8} bytes, last at {:.3}s",
            track.kind,
            track.packets,
            track.payload_bytes,
            track.last_timestamp.as_secs_f64()
        );
    }
    println!(
        "App audio tracks: {}",
        container.track_count(TrackKind::AppAudio)
    );

    recorder.shutdown().await;
    Ok(())
}
