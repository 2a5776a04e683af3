pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        None => s.to_string(),
        Some(_) if max_len == 0 => String::new(),
        Some(_) => {
            let cut = s
                .char_indices()
                .nth(max_len - 1)
                .map_or(s.len(), |(idx, _)| idx);
            format!("{}…", &s[..cut])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(wrap("alpha beta gamma", 10), vec!["alpha beta", "gamma"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("water#0", 20), "water#0");
        assert_eq!(truncate("methane.xyz#12", 8), "methane…");
        assert_eq!(truncate("abc", 0), "");
    }
}
