#![no_main]

use libfuzzer_sys::fuzz_target;
use pollbot_telegram::Update;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Ok(updates) = serde_json::from_str::<Vec<Update>>(&raw) else {
        return;
    };
    for update in updates {
        let encoded = serde_json::to_string(&update).expect("decoded update re-encodes");
        let decoded = serde_json::from_str::<Update>(&encoded).expect("re-encoded update decodes");
        assert_eq!(decoded, update);
        if let Some(user) = update.poll_answer.and_then(|answer| answer.user) {
            assert!(user.display_name().starts_with(user.first_name.as_str()));
        }
    }
});
