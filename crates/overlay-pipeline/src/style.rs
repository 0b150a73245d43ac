//! Template + override resolution.

use std::sync::Arc;
use tracing::debug;

use overlay_models::{FontCatalog, OverrideSet, Position, StyleDescriptor};

use crate::collaborators::TemplateStore;
use crate::error::{PipelineError, PipelineResult};

/// Resolves a template name and optional overrides to a full style.
#[derive(Clone)]
pub struct StyleResolver {
    templates: Arc<dyn TemplateStore>,
    fonts: FontCatalog,
}

impl StyleResolver {
    pub fn new(templates: Arc<dyn TemplateStore>, fonts: FontCatalog) -> Self {
        Self { templates, fonts }
    }

    pub fn fonts(&self) -> &FontCatalog {
        &self.fonts
    }

    /// Look up `template` and apply `overrides` on top of it.
    pub async fn resolve(
        &self,
        template: &str,
        overrides: Option<&OverrideSet>,
    ) -> PipelineResult<StyleDescriptor> {
        let base = self
            .templates
            .resolve(template)
            .await
            .ok_or_else(|| PipelineError::TemplateNotFound(template.to_string()))?;

        let style = match overrides {
            Some(o) if !o.is_empty() => apply_overrides(base.style, o, &self.fonts),
            _ => base.style,
        };

        debug!(
            template,
            font = %style.font_path.display(),
            font_size = style.font_size,
            position = %style.position,
            "Resolved style"
        );
        Ok(style)
    }
}

/// Merge `overrides` into `base`. Only fields present in `overrides` change.
///
/// `font_weight` wins over the legacy `font_family` when both are set. A
/// `custom` position without both coordinates falls back to `center`.
pub fn apply_overrides(
    mut style: StyleDescriptor,
    overrides: &OverrideSet,
    fonts: &FontCatalog,
) -> StyleDescriptor {
    if let Some(weight) = overrides.font_weight {
        style.font_weight = weight;
        style.font_path = fonts.for_weight(weight).to_path_buf();
    } else if let Some(family) = overrides.font_family {
        style.font_path = fonts.for_family(family).to_path_buf();
    }

    macro_rules! set {
        ($($field:ident),* $(,)?) => {
            $(
                if let Some(value) = &overrides.$field {
                    style.$field = value.clone();
                }
            )*
        };
    }

    set!(
        font_size,
        text_color,
        border_width,
        border_color,
        shadow_x,
        shadow_y,
        shadow_color,
        background_enabled,
        background_color,
        background_opacity,
        text_opacity,
        position,
        line_spacing,
    );

    if overrides.alignment.is_some() {
        style.alignment = overrides.alignment;
    }
    if overrides.custom_x.is_some() {
        style.custom_x = overrides.custom_x;
    }
    if overrides.custom_y.is_some() {
        style.custom_y = overrides.custom_y;
    }
    if overrides.max_text_width_percent.is_some() {
        style.max_text_width_percent = overrides.max_text_width_percent;
    }
    if overrides.fade_out_before_end.is_some() {
        style.fade_out_before_end = overrides.fade_out_before_end;
    }

    if style.position == Position::Custom && style.custom_coordinates().is_none() {
        style.position = Position::Center;
    }

    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::InMemoryTemplateStore;
    use overlay_models::{Alignment, FontFamily, StyleTemplate};
    use std::path::Path;

    fn fonts() -> FontCatalog {
        FontCatalog::from_dir("/fonts")
    }

    fn resolver() -> StyleResolver {
        StyleResolver::new(Arc::new(InMemoryTemplateStore::new(&fonts())), fonts())
    }

    fn base() -> StyleDescriptor {
        StyleTemplate::builtin_default(&fonts()).style
    }

    #[tokio::test]
    async fn test_no_overrides_is_template() {
        let style = resolver().resolve("default", None).await.unwrap();
        assert_eq!(style, base());

        let empty = OverrideSet::default();
        let style = resolver().resolve("default", Some(&empty)).await.unwrap();
        assert_eq!(style, base());
    }

    #[tokio::test]
    async fn test_unknown_template() {
        let err = resolver().resolve("nope", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::TemplateNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_resolution_is_deterministic() {
        let overrides = OverrideSet {
            font_weight: Some(300),
            text_color: Some("#FF00AA".to_string()),
            position: Some(Position::BottomCenter),
            ..Default::default()
        };
        let r = resolver();
        let a = r.resolve("default", Some(&overrides)).await.unwrap();
        let b = r.resolve("default", Some(&overrides)).await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_applying_twice_is_idempotent() {
        let overrides = OverrideSet {
            font_size: Some(40),
            background_enabled: Some(true),
            alignment: Some(Alignment::Left),
            max_text_width_percent: Some(60),
            ..Default::default()
        };
        let once = apply_overrides(base(), &overrides, &fonts());
        let twice = apply_overrides(once.clone(), &overrides, &fonts());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_only_present_fields_change() {
        let overrides = OverrideSet {
            text_color: Some("red".to_string()),
            ..Default::default()
        };
        let style = apply_overrides(base(), &overrides, &fonts());
        let mut expected = base();
        expected.text_color = "red".to_string();
        assert_eq!(style, expected);
    }

    #[test]
    fn test_font_selection() {
        let light = OverrideSet {
            font_weight: Some(400),
            ..Default::default()
        };
        let style = apply_overrides(base(), &light, &fonts());
        assert_eq!(style.font_path, Path::new("/fonts/TikTokSans-Medium.ttf"));
        assert_eq!(style.font_weight, 400);

        let legacy = OverrideSet {
            font_family: Some(FontFamily::Bold),
            ..Default::default()
        };
        let style = apply_overrides(base(), &legacy, &fonts());
        assert_eq!(style.font_path, Path::new("/fonts/Inter-Bold.ttf"));

        let both = OverrideSet {
            font_family: Some(FontFamily::Regular),
            font_weight: Some(700),
            ..Default::default()
        };
        let style = apply_overrides(base(), &both, &fonts());
        assert_eq!(style.font_path, Path::new("/fonts/TikTokSans-SemiBold.ttf"));
    }

    #[test]
    fn test_custom_position() {
        let overrides = OverrideSet {
            position: Some(Position::Custom),
            custom_x: Some(50),
            custom_y: Some(900),
            ..Default::default()
        };
        let style = apply_overrides(base(), &overrides, &fonts());
        assert_eq!(style.custom_coordinates(), Some((50, 900)));

        let incomplete = OverrideSet {
            position: Some(Position::Custom),
            custom_x: Some(50),
            ..Default::default()
        };
        let style = apply_overrides(base(), &incomplete, &fonts());
        assert_eq!(style.position, Position::Center);
    }

    #[test]
    fn test_alignment_only_set_when_overridden() {
        assert_eq!(base().alignment, None);

        let other = OverrideSet {
            font_size: Some(50),
            ..Default::default()
        };
        assert_eq!(apply_overrides(base(), &other, &fonts()).alignment, None);

        let centered = OverrideSet {
            alignment: Some(Alignment::Center),
            ..Default::default()
        };
        let style = apply_overrides(base(), &centered, &fonts());
        assert_eq!(style.alignment, Some(Alignment::Center));
    }

    #[test]
    fn test_optional_fields_override() {
        let overrides = OverrideSet {
            fade_out_before_end: Some(2.0),
            max_text_width_percent: Some(50),
            ..Default::default()
        };
        let style = apply_overrides(base(), &overrides, &fonts());
        assert_eq!(style.fade_out_before_end, Some(2.0));
        assert_eq!(style.max_text_width_percent, Some(50));
    }
}
