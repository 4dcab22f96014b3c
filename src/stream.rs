//! Realtime audio output: a pacing loop drains the playback buffer at
//! wall-clock rate and any number of TCP clients receive the result as an
//! endless WAV stream (e.g. `mpv tcp://127.0.0.1:7878`).

use crate::buffer::Sample;
use crate::config::StreamConfig;
use crate::event::{Event, EventBus};
use crate::player::{PlayerAction, SharedBuffer};
use byteorder::{LittleEndian, WriteBytesExt};
use hound::{SampleFormat, WavSpec};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Output format of the stream. The buffer always carries stereo pairs at
/// the synthesis rate.
pub const STREAM_SAMPLE_RATE: u32 = 24000;
pub const STREAM_CHANNELS: u16 = 2;
pub const STREAM_BIT_DEPTH: u16 = 16;

const TARGET_CHUNK_SIZE: usize = 240;

pub type StreamOutput = watch::Receiver<Vec<Sample>>;

pub fn init(bus: &EventBus, buffer: SharedBuffer, config: &StreamConfig) {
    let output = start_pacer(bus.clone(), buffer);
    serve(config.listen_addr.clone(), output);
}

/// Pulls fixed-size chunks from the playback buffer on a realtime clock,
/// publishing them for connected clients and reporting playback progress
/// and natural completion on the bus.
fn start_pacer(bus: EventBus, buffer: SharedBuffer) -> StreamOutput {
    let (tx, rx) = watch::channel(Vec::new());

    tokio::spawn(async move {
        let start_time = std::time::Instant::now();
        let mut sample_send_count: u64 = 0;
        let mut last_progress_secs: u64 = 0;

        let sleep_time = Duration::from_micros(
            ((TARGET_CHUNK_SIZE as f64 / STREAM_SAMPLE_RATE as f64) * 1_000_000.0) as u64,
        );

        loop {
            let expected_sent_samples = ((start_time.elapsed() + sleep_time).as_secs_f64()
                * STREAM_SAMPLE_RATE as f64) as u64;
            let chunk_size = (expected_sent_samples - sample_send_count) as usize;

            let mut finished = false;
            let mut progress = None;

            let chunk = match buffer.lock() {
                Ok(mut buf) => {
                    let chunk = buf.pull_samples(chunk_size);

                    let secs = buf.get_total_position_secs(STREAM_SAMPLE_RATE) as u64;
                    if secs != last_progress_secs {
                        last_progress_secs = secs;
                        progress = Some(secs);
                    }

                    // End of the attached audio: report once and reset
                    if buf.is_eof() && !buf.has_data() && buf.total_consumed() > 0 {
                        buf.clear();
                        last_progress_secs = 0;
                        finished = true;
                    }

                    chunk
                }
                Err(_) => vec![(0, 0); chunk_size],
            };

            if let Some(position) = progress {
                bus.send(Event::Player(PlayerAction::PlaybackProgress { position }));
            }
            if finished {
                bus.send(Event::Player(PlayerAction::Finished));
            }

            if tx.send(chunk).is_err() {
                warn!("Stream output channel closed, stopping pacer");
                break;
            }
            sample_send_count += chunk_size as u64;

            tokio::time::sleep(sleep_time).await;
        }
    });

    rx
}

fn serve(listen_addr: String, output: StreamOutput) {
    tokio::spawn(async move {
        let listener = match TcpListener::bind(&listen_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind audio stream listener on {listen_addr}: {e}");
                return;
            }
        };
        info!("Audio stream listening on {listen_addr}");

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("Audio stream client connected from {addr}");
                    handle_client(stream, output.clone());
                }
                Err(e) => error!("Failed to accept stream connection: {e}"),
            }
        }
    });
}

fn handle_client(mut stream: tokio::net::TcpStream, mut output: StreamOutput) {
    tokio::spawn(async move {
        let spec = WavSpec {
            channels: STREAM_CHANNELS,
            sample_rate: STREAM_SAMPLE_RATE,
            bits_per_sample: STREAM_BIT_DEPTH,
            sample_format: SampleFormat::Int,
        };

        // Write a wav header for an endless stream so players recognize
        // the format
        let header = spec.into_header_for_infinite_file();
        if let Err(e) = stream.write_all(&header[..]).await {
            warn!("Failed to write wav header: {e}");
            return;
        }

        loop {
            if output.changed().await.is_err() {
                break;
            }

            let samples = output.borrow_and_update().clone();
            let mut wav_data: Vec<u8> = Vec::with_capacity(samples.len() * 4);

            for (left, right) in samples {
                WriteBytesExt::write_i16::<LittleEndian>(&mut wav_data, left).unwrap();
                WriteBytesExt::write_i16::<LittleEndian>(&mut wav_data, right).unwrap();
            }

            if let Err(e) = stream.write_all(wav_data.as_slice()).await {
                debug!("Audio stream client disconnected: {e}");
                break;
            }
        }
    });
}
