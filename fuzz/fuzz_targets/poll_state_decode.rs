#![no_main]

use libfuzzer_sys::fuzz_target;
use pollbot_core::{previous_occurrence_of_weekday, PersistentPollState, EVALUATION_WEEKDAY};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Ok(state) = serde_json::from_str::<PersistentPollState>(&raw) else {
        return;
    };
    let encoded = serde_json::to_string(&state).expect("decoded state re-encodes");
    let decoded =
        serde_json::from_str::<PersistentPollState>(&encoded).expect("re-encoded state decodes");
    assert_eq!(decoded, state);
    if let Some(polling_date) = state.polling_date {
        assert!(previous_occurrence_of_weekday(EVALUATION_WEEKDAY, polling_date) <= polling_date);
    }
});
