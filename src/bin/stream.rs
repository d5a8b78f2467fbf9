use std::io;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use picoscope::{Channel, ChannelConfiguration, RatioMode, SampleInterval, TimeUnit};
use picoscope::{Session, SessionConfig};

const BUFFER_LENGTH: usize = 10_000;
const POLL_COUNT: usize = 15;
const POLL_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct Batch {
    channel: Channel,
    timestamp: String,
    samples: Vec<i16>,
}

fn write_batches(receiver: Receiver<Batch>) -> picoscope::Result<usize> {
    let mut written = 0;
    for batch in receiver {
        let filename = format!("{}_{}.raw", batch.channel, batch.timestamp);
        std::fs::write(&filename, bytemuck::cast_slice::<i16, u8>(&batch.samples))?;
        log::debug!("saved {} samples to {}", batch.samples.len(), filename);
        written += 1;
    }
    Ok(written)
}

fn main() -> picoscope::Result<()> {
    let mut config = SessionConfig::default();
    if let Some(library_path) = std::env::args_os().nth(1) {
        config.library_path = library_path.into();
    }
    env_logger::Builder::new()
        .filter_level(config.verbosity)
        .parse_default_env()
        .init();

    // samples are written to disk off the poll path
    let (sender, receiver) = mpsc::channel();
    let writer = thread::spawn(move || write_batches(receiver));

    let result = Session::with(config, |scope| {
        scope.configure_channel(Channel::A, &ChannelConfiguration::default())?;
        scope.arm_buffer(Channel::A, BUFFER_LENGTH)?;
        let interval = scope.start_streaming(
            SampleInterval::new(1000, TimeUnit::Microseconds), 1, RatioMode::NONE)?;
        println!("streaming at {:.0} samples/s", interval.sample_rate());

        thread::sleep(POLL_PERIOD);
        for _ in 0..POLL_COUNT {
            thread::sleep(POLL_PERIOD);
            let event = scope.poll()?;
            if event.overflowed() {
                println!("overflow on channel(s) {:?}", event.overflow.channels().collect::<Vec<_>>());
            }
            if event.is_empty() {
                continue
            }
            let timestamp = chrono::Local::now().format("%Y%m%d_%H_%M_%S_%6f").to_string();
            for channel in scope.armed_channels().channels() {
                let samples = scope.samples(channel, &event)?;
                println!("channel {}: {} samples at {}, first {}",
                         channel, samples.len(), event.start_index, samples[0]);
                sender.send(Batch { channel, timestamp: timestamp.clone(), samples: samples.to_vec() })
                    .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "sample writer stopped"))?;
            }
        }
        scope.stop()
    });

    drop(sender);
    let written = writer.join()
        .map_err(|_| io::Error::other("sample writer panicked"))?;
    result?;
    println!("saved {} batches", written?);
    Ok(())
}
