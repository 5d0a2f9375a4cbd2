//! End-to-end checks: scenes and voices driven through the sample clock.

use tinysynth_engine::{Engine, Generator, PwmTimer, SampleClock, Scene, Voice};

const SR: u32 = 22_050;

fn rising_crossings(samples: &[u8]) -> usize {
    samples.windows(2).filter(|w| w[0] < 128 && w[1] >= 128).count()
}

#[test]
fn held_a4_crosses_centre_440_times_a_second() {
    let mut voice = Voice::new(SR);
    voice.note_on(69);
    // let the attack settle before measuring
    for _ in 0..SR / 10 {
        voice.next();
    }
    let mut engine = Engine::with_sample_rate(voice, SR);
    let mut clock = SampleClock::new(PwmTimer::new(SR), Vec::with_capacity(SR as usize));
    clock.run(&mut engine, SR as usize);
    let out = clock.into_sink();

    assert_eq!(out.len(), SR as usize);
    let n = rising_crossings(&out);
    assert!((435..=445).contains(&n), "crossings={n}");
}

#[test]
fn every_named_scene_makes_sound() {
    for name in ["arp", "bass", "drone", "plucks"] {
        let scene = Scene::by_name(name, SR, 42).expect("known scene");
        let mut engine = Engine::with_sample_rate(scene, SR);
        let mut out = vec![0u8; SR as usize / 2];
        tinysynth_engine::output::render(&mut engine, &mut out);
        assert!(out.iter().any(|&s| s != 128), "{name} stayed silent");
        assert_eq!(engine.ticks(), out.len() as u64);
    }
}

#[test]
fn timer_rates_stay_close_to_requested() {
    for sr in [8_000u32, 16_000, 22_050, 44_100] {
        let t = PwmTimer::new(sr);
        let err = (f64::from(t.effective_sample_rate()) - f64::from(sr)).abs() / f64::from(sr);
        assert!(err < 0.005, "{sr} Hz -> {} Hz", t.effective_sample_rate());
    }
}

#[test]
fn scenes_survive_a_sample_rate_change() {
    let mut engine = Engine::with_sample_rate(Scene::arpeggio(SR), SR);
    for _ in 0..1_000 {
        engine.next(SR);
    }
    for _ in 0..1_000 {
        engine.next(44_100);
    }
    assert_eq!(engine.sample_rate(), 44_100);
    assert_eq!(engine.scene_mut().samples_per_step(), 44_100 * 60 / 480);
}
