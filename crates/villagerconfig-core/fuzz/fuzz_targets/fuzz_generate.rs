#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use villagerconfig_core::context::{RuntimeContext, Weather};
use villagerconfig_core::mixer::StackMixer;
use villagerconfig_core::test_utils::{librarian, librarian_data};
use villagerconfig_core::trade::generate_trades;

/// Context knobs for the librarian fixture.
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    seed: i64,
    accumulated_exp: u32,
    luck: f64,
    daytime: i64,
    weather: u8,
    container: bool,
}

fuzz_target!(|input: FuzzInput| {
    let doc = librarian();
    let data = librarian_data();
    let weather = match input.weather % 3 {
        0 => Weather::Clear,
        1 => Weather::Rain,
        _ => Weather::Thunder,
    };
    let mixer = if input.container {
        StackMixer::Container
    } else {
        StackMixer::Default
    };
    let ctx = RuntimeContext::new(input.seed)
        .with_data(&data)
        .with_accumulated_exp(input.accumulated_exp)
        .with_luck(input.luck)
        .with_daytime(input.daytime)
        .with_weather(weather)
        .with_stack_mixer(mixer);

    let first = generate_trades(&doc, &ctx).unwrap();
    let second = generate_trades(&doc, &ctx).unwrap();
    assert_eq!(first, second);
});
