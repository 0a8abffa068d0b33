//! Small value grammars shared by templates, the sidebar and the host glue.
//!
//! Built on `winnow` 0.7. Covers CSS colors (`#rgb`, `#rrggbb`,
//! `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)`), canvas size presets
//! (`1080x1350`) and font style strings (`bold italic`).

use crate::model::{Color, FontStyle};
use winnow::ascii::{dec_uint, space0, space1};
use winnow::combinator::{alt, delimited, opt, preceded, separated, separated_pair};
use winnow::prelude::*;
use winnow::token::take_while;

/// Parse a CSS color. Whitespace around the value is ignored.
pub fn parse_color(input: &str) -> Option<Color> {
    css_color.parse(input.trim()).ok()
}

/// Parse a `WIDTHxHEIGHT` size preset.
pub fn parse_size_preset(input: &str) -> Option<(u32, u32)> {
    size_preset.parse(input.trim()).ok()
}

/// Parse a font style string. Numeric weights of 600 and above count as bold.
pub fn parse_font_style(input: &str) -> Option<FontStyle> {
    font_style.parse(input.trim()).ok()
}

fn css_color(input: &mut &str) -> ModalResult<Color> {
    alt((hex_color, rgb_color)).parse_next(input)
}

fn hex_color(input: &mut &str) -> ModalResult<Color> {
    preceded('#', take_while(3..=8, |c: char| c.is_ascii_hexdigit()))
        .verify_map(Color::from_hex)
        .parse_next(input)
}

fn rgb_color(input: &mut &str) -> ModalResult<Color> {
    alt((
        delimited(
            "rgba(",
            (
                channel,
                preceded(',', channel),
                preceded(',', channel),
                preceded(',', alpha),
            ),
            ')',
        )
        .map(|(r, g, b, a)| Color::rgba(r, g, b, a)),
        delimited(
            "rgb(",
            (channel, preceded(',', channel), preceded(',', channel)),
            ')',
        )
        .map(|(r, g, b)| Color::rgb(r, g, b)),
    ))
    .parse_next(input)
}

fn channel(input: &mut &str) -> ModalResult<u8> {
    delimited(space0, dec_uint, space0).parse_next(input)
}

fn alpha(input: &mut &str) -> ModalResult<u8> {
    delimited(space0, unit_float, space0)
        .map(|a: f32| (a.clamp(0.0, 1.0) * 255.0).round() as u8)
        .parse_next(input)
}

fn unit_float(input: &mut &str) -> ModalResult<f32> {
    (
        take_while(0.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
    )
        .take()
        .try_map(str::parse::<f32>)
        .parse_next(input)
}

fn size_preset(input: &mut &str) -> ModalResult<(u32, u32)> {
    separated_pair(dec_uint, alt(('x', 'X')), dec_uint).parse_next(input)
}

#[derive(Clone, Copy)]
enum StyleToken {
    Bold,
    Italic,
    Normal,
}

fn style_token(input: &mut &str) -> ModalResult<StyleToken> {
    alt((
        "bold".value(StyleToken::Bold),
        "italic".value(StyleToken::Italic),
        "normal".value(StyleToken::Normal),
        dec_uint.map(|weight: u32| {
            if weight >= 600 {
                StyleToken::Bold
            } else {
                StyleToken::Normal
            }
        }),
    ))
    .parse_next(input)
}

fn font_style(input: &mut &str) -> ModalResult<FontStyle> {
    let tokens: Vec<StyleToken> = separated(0.., style_token, space1).parse_next(input)?;
    let mut style = FontStyle::default();
    for token in tokens {
        match token {
            StyleToken::Bold => style.bold = true,
            StyleToken::Italic => style.italic = true,
            StyleToken::Normal => {}
        }
    }
    Ok(style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_rgb_colors() {
        assert_eq!(parse_color("#05eafa"), Some(Color::rgb(0x05, 0xEA, 0xFA)));
        assert_eq!(parse_color(" #fff "), Some(Color::WHITE));
        assert_eq!(parse_color("rgb(51, 51, 51)"), Some(Color::rgb(51, 51, 51)));
        assert_eq!(
            parse_color("rgba(0,0,0,0.5)"),
            Some(Color::rgba(0, 0, 0, 128))
        );
        assert_eq!(parse_color("rgb(300, 0, 0)"), None);
        assert_eq!(parse_color("black"), None);
    }

    #[test]
    fn parses_size_presets() {
        assert_eq!(parse_size_preset("1080x1350"), Some((1080, 1350)));
        assert_eq!(parse_size_preset("300X550"), Some((300, 550)));
        assert_eq!(parse_size_preset("1080 by 1350"), None);
    }

    #[test]
    fn parses_font_styles() {
        assert_eq!(parse_font_style("normal"), Some(FontStyle::default()));
        assert_eq!(
            parse_font_style("italic bold"),
            Some(FontStyle {
                bold: true,
                italic: true
            })
        );
        assert_eq!(
            parse_font_style("700"),
            Some(FontStyle {
                bold: true,
                italic: false
            })
        );
        assert_eq!(parse_font_style(""), Some(FontStyle::default()));
        assert_eq!(parse_font_style("oblique"), None);
    }
}
