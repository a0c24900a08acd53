//! Docking options from the options-extraction reply.

use pharmadock_llm::extract::{extract_object, field_flag, field_str, JsonObject};
use pharmadock_molecules::DockingOptions;

pub fn from_object(map: &JsonObject) -> DockingOptions {
    DockingOptions {
        box_enveloping: field_flag(map, "box_enveloping"),
        box_size: field_str(map, "box_size"),
        box_center: field_str(map, "box_center"),
        padding: field_str(map, "padding"),
        exhaustiveness: field_str(map, "exhaustiveness"),
        scoring: field_str(map, "scoring"),
    }
}

/// `None` when the reply holds no JSON object at all.
pub fn from_reply(reply: &str) -> Option<DockingOptions> {
    extract_object(reply).map(|map| from_object(&map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_requested() {
        let o = from_reply(r#"{"box_enveloping": "True", "padding": null}"#).unwrap();
        assert_eq!(o.as_command_string(), "--box_enveloping");
    }

    #[test]
    fn test_custom_box() {
        let reply = r#"```json
{
    "box_enveloping": "False",
    "padding": null,
    "exhaustiveness": 16,
    "scoring": "ad4",
    "box_size": "20 20 20",
    "box_center": "1.5 2 -3"
}
```"#;
        let o = from_reply(reply).unwrap();
        assert_eq!(
            o.as_command_string(),
            "--box_size 20 20 20 --box_center 1.5 2 -3 --exhaustiveness 16 --scoring ad4"
        );
    }

    #[test]
    fn test_no_json() {
        assert_eq!(from_reply("sorry, no idea"), None);
    }
}
