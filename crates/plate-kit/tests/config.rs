use std::time::Duration;

use gpui_plate_kit::{BubbleSymbol, KitConfig, MapTranslator, NodeType, Translator, builtin};

#[test]
fn defaults_fill_in_zero_values() {
    let config = KitConfig::default();
    assert_eq!(config.assistant.completion_timeout_ms, 60_000);
    assert_eq!(config.assistant.completion_timeout(), Duration::from_secs(60));
    assert_eq!(config.palette.max_commands_per_group, 0);
    assert_eq!(config.bubble_menu, builtin::bubble_menu_map());

    let explicit_zero =
        KitConfig::from_json_str(r#"{ "assistant": { "completion_timeout_ms": 0 } }"#).unwrap();
    assert_eq!(explicit_zero.assistant.completion_timeout_ms, 60_000);
}

#[test]
fn partial_json_overrides_only_what_it_names() {
    let config = KitConfig::from_json_str(
        r#"{
            "palette": { "max_commands_per_group": 4 },
            "bubble_menu": { "text": ["bold", "divider", "ai"] }
        }"#,
    )
    .unwrap();

    assert_eq!(config.assistant.completion_timeout_ms, 60_000);
    assert_eq!(config.palette.max_commands_per_group, 4);
    assert_eq!(
        config.bubble_menu.symbols(NodeType::Text),
        &[
            BubbleSymbol::Extension("bold".to_string()),
            BubbleSymbol::Divider,
            BubbleSymbol::Extension("ai".to_string()),
        ]
    );
    assert!(config.bubble_menu.symbols(NodeType::Link).is_empty());
}

#[test]
fn config_survives_a_json_round_trip() {
    let config = KitConfig::default();
    let json = config.to_json_pretty().unwrap();
    assert_eq!(KitConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn malformed_config_is_an_error() {
    assert!(KitConfig::from_json_str(r#"{ "assistant": { "completion_timeout_ms": "soon" } }"#).is_err());
    assert!(KitConfig::from_json_str(r#"{ "bubble_menu": { "table": ["bold"] } }"#).is_err());
}

#[test]
fn translations_load_from_json_and_fall_back_to_keys() {
    let translator = MapTranslator::from_json_str(r#"{ "editor.bold": "Gras" }"#).unwrap();
    assert_eq!(translator.translate("editor.bold"), "Gras");
    assert_eq!(translator.translate("editor.italic"), "editor.italic");
}
