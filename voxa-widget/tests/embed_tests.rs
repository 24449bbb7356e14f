use proptest::prelude::*;
use voxa_widget::{generate, EmbedFormat, Position, Theme, WidgetConfig};

#[test]
fn test_markup_reflects_config() {
    let config = WidgetConfig {
        theme: Theme::Dark,
        position: Position::TopLeft,
        show_branding: false,
        ..Default::default()
    };
    let out = generate(EmbedFormat::Markup, &config);
    assert!(out.contains(r#"theme: "dark""#));
    assert!(out.contains(r#"position: "top-left""#));
    assert!(out.contains("showBranding: false"));
    assert!(!out.contains("logoUrl"));
}

#[test]
fn test_every_format_names_loader() {
    let config = WidgetConfig::default();
    for format in [EmbedFormat::Markup, EmbedFormat::Component, EmbedFormat::Plugin] {
        assert!(generate(format, &config).contains("widget-loader.js"), "{}", format);
    }
}

fn position() -> impl Strategy<Value = Position> {
    prop_oneof![
        Just(Position::BottomRight),
        Just(Position::BottomLeft),
        Just(Position::TopRight),
        Just(Position::TopLeft),
    ]
}

proptest! {
    #[test]
    fn prop_generation_is_deterministic(
        title in ".{1,40}",
        welcome in ".{0,80}",
        api_key in "[A-Za-z0-9]{0,24}",
        dark in any::<bool>(),
        branding in any::<bool>(),
        position in position(),
    ) {
        let config = WidgetConfig {
            api_key,
            widget_title: title,
            welcome_message: welcome,
            theme: if dark { Theme::Dark } else { Theme::Light },
            show_branding: branding,
            position,
            ..Default::default()
        };
        for format in [EmbedFormat::Markup, EmbedFormat::Component, EmbedFormat::Plugin] {
            prop_assert_eq!(generate(format, &config), generate(format, &config.clone()));
        }
    }

    #[test]
    fn prop_markup_never_breaks_out_of_script(title in ".{0,40}") {
        let config = WidgetConfig { widget_title: title, ..Default::default() };
        let out = generate(EmbedFormat::Markup, &config);
        prop_assert_eq!(out.matches("</script>").count(), 2);
    }
}
