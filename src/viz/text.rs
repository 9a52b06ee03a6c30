//! Text measurement and truncation.

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Cut `text` so it fits `max_px`, ending in a single ellipsis when shortened.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out: String = String::new();
    for ch in text.chars() {
        out.push(ch);
        if estimate_text_width_px(&out, font_px) + estimate_text_width_px("…", font_px) > max_px {
            out.pop();
            break;
        }
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("N06A", 10, 200), "N06A");
    }

    #[test]
    fn long_text_gets_one_ellipsis() {
        let t = truncate_to_width("a very long legend label indeed", 10, 60);
        assert!(t.ends_with('…'));
        assert_eq!(t.matches('…').count(), 1);
        assert!(estimate_text_width_px(&t, 10) <= 60);
    }
}
