use crate::cache::THEME_KEY;
use crate::cli::ThemeCommand;
use crate::config::Config;
use crate::error::{ChatmateError, FieldError, Result};
use crate::theme::{palette, spacing, typography, Size, ThemeMode, ThemeSettings};
use colored::Colorize;

use super::open_cache;

/// Handle theme commands
pub fn handle_theme(config: Config, command: ThemeCommand) -> Result<()> {
    let cache = open_cache(&config)?;
    let current: ThemeSettings = cache.get(THEME_KEY)?.unwrap_or_default();

    match command {
        ThemeCommand::Show { system_dark } => print_theme(&current, system_dark),
        ThemeCommand::Set { mode, font_scale } => {
            let updated = apply_changes(current, mode.as_deref(), font_scale)?;
            cache.set(THEME_KEY, &updated)?;
            println!(
                "{}",
                format!(
                    "Theme set to {:?}, font scale {:.2}",
                    updated.mode, updated.font_scale
                )
                .green()
            );
        }
    }

    Ok(())
}

/// Apply requested changes to `settings`; the scale is stored clamped
fn apply_changes(
    mut settings: ThemeSettings,
    mode: Option<&str>,
    font_scale: Option<f32>,
) -> Result<ThemeSettings> {
    if let Some(mode) = mode {
        settings.mode = mode
            .parse::<ThemeMode>()
            .map_err(|e| ChatmateError::Validation(vec![FieldError::new("mode", e)]))?;
    }
    if let Some(scale) = font_scale {
        settings.font_scale = scale;
        settings.font_scale = settings.clamped_scale();
    }
    Ok(settings)
}

fn print_theme(settings: &ThemeSettings, system_dark: bool) {
    let dark = settings.mode.is_dark(system_dark);
    let colors = palette(dark);
    let type_scale = typography(settings.clamped_scale());

    println!(
        "\nMode: {:?} ({})  Font scale: {:.2}",
        settings.mode,
        if dark { "dark" } else { "light" },
        settings.clamped_scale()
    );

    println!("\n{}", "Palette".bold());
    for (name, value) in [
        ("background", colors.background),
        ("surface", colors.surface),
        ("primary", colors.primary),
        ("text", colors.text),
        ("text_secondary", colors.text_secondary),
        ("user_bubble", colors.user_bubble),
        ("assistant_bubble", colors.assistant_bubble),
        ("error", colors.error),
    ] {
        println!("  {:<18}{}", name, value);
    }

    println!("\n{}", "Typography".bold());
    for (name, size) in [
        ("caption", type_scale.caption),
        ("body", type_scale.body),
        ("subtitle", type_scale.subtitle),
        ("title", type_scale.title),
        ("headline", type_scale.headline),
    ] {
        println!(
            "  {:<18}{:>5.1}px / {}px",
            name,
            size,
            type_scale.line_height_for(size)
        );
    }

    println!("\n{}", "Spacing".bold());
    let steps: Vec<String> = [Size::Xs, Size::Sm, Size::Md, Size::Lg, Size::Xl]
        .iter()
        .map(|s| spacing(*s).to_string())
        .collect();
    println!("  {}\n", steps.join(" / "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::MAX_FONT_SCALE;

    #[test]
    fn test_apply_changes_sets_mode_and_clamps_scale() {
        let updated = apply_changes(ThemeSettings::default(), Some("dark"), Some(9.0)).unwrap();
        assert_eq!(updated.mode, ThemeMode::Dark);
        assert_eq!(updated.font_scale, MAX_FONT_SCALE);
    }

    #[test]
    fn test_apply_changes_keeps_unspecified_fields() {
        let start = ThemeSettings {
            mode: ThemeMode::Light,
            font_scale: 1.2,
        };
        let updated = apply_changes(start, None, None).unwrap();
        assert_eq!(updated, start);
    }

    #[test]
    fn test_apply_changes_rejects_unknown_mode() {
        assert!(apply_changes(ThemeSettings::default(), Some("sepia"), None).is_err());
    }
}
