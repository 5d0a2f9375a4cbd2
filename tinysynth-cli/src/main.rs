//! tinysynth CLI: real-time player and offline WAV renderer for tinysynth scenes.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, info, warn};
use tinysynth_engine::{u8_to_f32, Engine, PwmTimer, SampleClock, Scene, Voice};

const DEFAULT_PATTERN: &str = "arp";
const DEFAULT_GAIN: f32 = 0.35;
const DEFAULT_WAV_SECONDS: u64 = 10;

#[derive(Debug, Default)]
struct Args {
    list_devices: bool,
    device_name: Option<String>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
    duration_sec: Option<u64>,
    patch: Option<String>,
    pattern: Option<String>,
    tempo: Option<f32>,
    gain: Option<f32>,
    seed: Option<u64>,
    wav: Option<String>,
}

fn parse_args() -> Args {
    let mut a = Args::default();
    for s in std::env::args().skip(1) {
        if s == "--list-devices" { a.list_devices = true; continue; }
        if let Some(rest) = s.strip_prefix("--device=")      { a.device_name  = Some(rest.to_string()); continue; }
        if let Some(rest) = s.strip_prefix("--sample-rate=") { a.sample_rate  = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--channels=")    { a.channels     = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--duration=")    { a.duration_sec = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--patch=")       { a.patch        = Some(rest.to_string()); continue; }
        if let Some(rest) = s.strip_prefix("--pattern=")     { a.pattern      = Some(rest.to_string()); continue; }
        if let Some(rest) = s.strip_prefix("--tempo=")       { a.tempo        = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--gain=")        { a.gain         = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--seed=")        { a.seed         = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--wav=")         { a.wav          = Some(rest.to_string()); continue; }
        warn!("unknown arg: {s}");
    }
    a
}

fn list_output_devices() -> Result<()> {
    let host = cpal::default_host();
    println!("Available output devices:");
    for dev in host.output_devices().context("enumerating output devices")? {
        println!("- {}", dev.name()?);
    }
    Ok(())
}

fn pick_device(args: &Args) -> Result<cpal::Device> {
    let host = cpal::default_host();
    if let Some(name) = &args.device_name {
        for d in host.output_devices()? {
            if d.name()? == *name { return Ok(d); }
        }
        bail!("requested device not found: {name}");
    }
    host.default_output_device()
        .ok_or_else(|| anyhow!("no default output device"))
}

fn choose_config(
    device: &cpal::Device,
    req_sr: Option<u32>,
    req_ch: Option<u16>,
) -> Result<cpal::SupportedStreamConfig> {
    if req_sr.is_none() && req_ch.is_none() {
        return device.default_output_config().context("querying default output config");
    }

    let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
    for range in device.supported_output_configs()? {
        let ch     = range.channels();
        let sr_min = range.min_sample_rate().0;
        let sr_max = range.max_sample_rate().0;

        let ch_pen = req_ch.map_or(0, |c| u64::from(ch.abs_diff(c)));
        let sr_pen = match req_sr {
            Some(sr) if !(sr_min..=sr_max).contains(&sr) => u64::from(sr_min.abs_diff(sr).min(sr_max.abs_diff(sr))),
            _ => 0,
        };

        let score = sr_pen.saturating_mul(1000) + ch_pen;
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((score, range));
        }
    }

    let (_, range) = best.ok_or_else(|| anyhow!("no supported output configs"))?;

    let (lo, hi) = (range.min_sample_rate().0, range.max_sample_rate().0);
    let pick_sr = cpal::SampleRate(req_sr.unwrap_or(tinysynth_engine::DEFAULT_SAMPLE_RATE).clamp(lo, hi));

    Ok(range.with_sample_rate(pick_sr))
}

fn make_voice(name: &str, sr: u32) -> Result<Voice> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "lead" => Voice::lead(sr),
        "bass" => Voice::bass(sr),
        "pad" => Voice::pad(sr),
        "pluck" => Voice::pluck(sr),
        "sine" | "init" => Voice::new(sr),
        other => bail!("unknown patch: {other} (expected lead, bass, pad, pluck or sine)"),
    })
}

fn make_scene(args: &Args, sr: u32) -> Result<Scene> {
    let pattern = args.pattern.as_deref().unwrap_or(DEFAULT_PATTERN);
    let mut scene = Scene::by_name(pattern, sr, args.seed.unwrap_or(0))
        .ok_or_else(|| anyhow!("unknown pattern: {pattern} (expected arp, bass, drone or plucks)"))?;
    if let Some(patch) = &args.patch {
        *scene.voice_mut() = make_voice(patch, sr)?;
    }
    if let Some(tempo) = args.tempo {
        scene.set_tempo(tempo);
    }
    info!(
        "pattern: {pattern} | patch: {} | {} samples/step",
        args.patch.as_deref().unwrap_or("default"),
        scene.samples_per_step()
    );
    Ok(scene)
}

fn render_wav(path: &Path, args: &Args, gain: f32) -> Result<()> {
    let sr = args.sample_rate.unwrap_or(tinysynth_engine::DEFAULT_SAMPLE_RATE);
    let seconds = args.duration_sec.unwrap_or(DEFAULT_WAV_SECONDS);
    let ticks = usize::try_from(u64::from(sr) * seconds).context("render length overflows")?;

    let mut engine = Engine::with_sample_rate(make_scene(args, sr)?, sr);
    let mut clock = SampleClock::new(PwmTimer::new(sr), Vec::with_capacity(ticks));
    clock.run(&mut engine, ticks);
    let samples = clock.into_sink();

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sr,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    for s in samples {
        let v = (u8_to_f32(s) * gain).clamp(-1.0, 1.0);
        writer.write_sample((v * f32::from(i16::MAX)) as i16)?;
    }
    writer.finalize().context("finalizing wav")?;

    info!("wrote {seconds}s at {sr} Hz to {}", path.display());
    Ok(())
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    mut engine: Engine<Scene>,
    gain: f32,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let sr = cfg.sample_rate.0;
    let channels = usize::from(cfg.channels);

    // ~1 second meter at the stream rate
    let meter_interval = sr.max(1) as usize;
    let mut meter_count: usize = 0;
    let mut meter_peak: f32 = 0.0;

    let stream = device.build_output_stream(
        cfg,
        move |output: &mut [T], _| {
            for frame in output.chunks_mut(channels) {
                let s = (u8_to_f32(engine.next(sr)) * gain).clamp(-1.0, 1.0);

                let v: T = T::from_sample(s);
                for ch in frame.iter_mut() { *ch = v; }

                meter_peak = meter_peak.max(s.abs());
                meter_count += 1;
                if meter_count >= meter_interval {
                    debug!("peak ~ {meter_peak:.3}");
                    meter_peak = 0.0;
                    meter_count = 0;
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args();

    if args.list_devices {
        return list_output_devices();
    }

    let gain = args.gain.unwrap_or(DEFAULT_GAIN);

    if let Some(path) = &args.wav {
        return render_wav(Path::new(path), &args, gain);
    }

    let device  = pick_device(&args)?;
    let sup_cfg = choose_config(&device, args.sample_rate, args.channels)?;
    let sample_format = sup_cfg.sample_format();
    let mut cfg = sup_cfg.config();

    if let Some(sr) = args.sample_rate { cfg.sample_rate = cpal::SampleRate(sr); }
    if let Some(ch) = args.channels    { cfg.channels    = ch; }

    let sr = cfg.sample_rate.0;
    let engine = Engine::with_sample_rate(make_scene(&args, sr)?, sr);

    info!("device: {}", device.name()?);
    info!("stream config: {cfg:?} (sample_format: {sample_format:?}) | gain {gain:.2}");
    if let Some(d) = args.duration_sec { info!("auto-stop after {d} seconds"); }
    println!("Press Ctrl+C to stop…");

    let err_fn = |e: cpal::StreamError| warn!("stream error: {e}");

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &cfg, engine, gain, err_fn)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &cfg, engine, gain, err_fn)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &cfg, engine, gain, err_fn)?,
        cpal::SampleFormat::U8  => build_stream::<u8>(&device, &cfg, engine, gain, err_fn)?,
        other => bail!("unsupported device sample format: {other:?}"),
    };

    stream.play().context("starting output stream")?;

    if let Some(d) = args.duration_sec {
        std::thread::sleep(Duration::from_secs(d));
        return Ok(());
    }

    loop { std::thread::sleep(Duration::from_millis(500)); }
}
