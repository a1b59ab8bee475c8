#![no_main]

use libfuzzer_sys::fuzz_target;

use telegram_entities::utf16::utf16_len;
use telegram_entities::Message;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(message) = Message::from_html(s)
    {
        let len = utf16_len(&message.text);
        for entity in &message.entities {
            assert!(entity.length > 0 && entity.end() <= len);
        }
        let _ = message.to_bot_html();
        let _ = message.to_markdown();
    }
});
