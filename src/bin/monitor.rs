use std::thread;
use std::time::{Duration, Instant};

use picoscope::{Channel, ChannelConfiguration, RatioMode, SampleInterval, TimeUnit};
use picoscope::{Session, SessionConfig};

const BUFFER_LENGTH: usize = 1 << 20;
const RUN_TIME: Duration = Duration::from_secs(600);
const POLL_PERIOD: Duration = Duration::from_millis(500);

fn main() -> picoscope::Result<()> {
    let mut config = SessionConfig::default();
    if let Some(library_path) = std::env::args_os().nth(1) {
        config.library_path = library_path.into();
    }
    env_logger::Builder::new()
        .filter_level(config.verbosity)
        .parse_default_env()
        .init();

    println!("initializing fast streaming");
    Session::with(config, |scope| {
        let channel_config = ChannelConfiguration::default();
        scope.configure_channel(Channel::A, &channel_config)?;
        scope.arm_buffer(Channel::A, BUFFER_LENGTH)?;
        let interval = scope.start_streaming(
            SampleInterval::new(2, TimeUnit::Microseconds), 1, RatioMode::NONE)?;
        println!("streaming at {:.0} samples/s", interval.sample_rate());

        thread::sleep(POLL_PERIOD);
        let started = Instant::now();
        while started.elapsed() < RUN_TIME {
            thread::sleep(POLL_PERIOD);
            let event = scope.poll()?;
            let samples = scope.samples(Channel::A, &event)?;
            let (min, max) = samples.iter().fold((i16::MAX, i16::MIN),
                |(min, max), &code| (min.min(code), max.max(code)));
            if samples.is_empty() {
                println!("buffer overflow: {}, no samples", event.overflowed());
            } else {
                println!("buffer overflow: {}, {} samples, {:+.4}..{:+.4} V",
                         event.overflowed(), samples.len(),
                         channel_config.range.code_to_volts(min),
                         channel_config.range.code_to_volts(max));
            }
            if event.auto_stop {
                break
            }
        }
        println!("{} samples, {} overflow(s)", scope.samples_received(), scope.overflow_count());
        scope.stop()
    })
}
