//! Splits a message into posts that fit the platform character limit.
//!
//! Posts after the first start with `"... "`, posts before the last end with
//! `" ..."`, and every post carries the same mention prefix.

const LEADING_MARKER: &str = "... ";
const TRAILING_MARKER: &str = " ...";
const MARKER_LEN: usize = 4;

/// Split `message` into an ordered sequence of posts of at most `limit`
/// characters each.
///
/// The only post allowed to exceed `limit` is one holding a single word that
/// cannot fit even on its own.
pub fn tokenize(message: &str, limit: usize, mentions: &[String]) -> Vec<String> {
    let prefix = mention_prefix(mentions);
    let prefix_len = char_len(&prefix);

    if prefix_len + char_len(message) <= limit {
        return vec![format!("{prefix}{message}")];
    }

    let words: Vec<&str> = message.split(' ').collect();
    let mut posts = Vec::new();
    let mut start = 0usize;

    while start < words.len() {
        let leading = if start > 0 { MARKER_LEN } else { 0 };
        let end = pack(&words, start, limit.saturating_sub(prefix_len + leading));

        let mut post = prefix.clone();
        if start > 0 {
            post.push_str(LEADING_MARKER);
        }
        post.push_str(&words[start..end].join(" "));
        if end < words.len() {
            post.push_str(TRAILING_MARKER);
        }
        posts.push(post);

        start = end;
    }

    posts
}

/// Return the exclusive end index of the words packed into one post.
///
/// `budget` is what is left after the prefix and the leading marker. Always
/// consumes at least one word.
fn pack(words: &[&str], start: usize, budget: usize) -> usize {
    let rest = &words[start..];
    let rest_len = rest.iter().map(|w| char_len(w)).sum::<usize>() + rest.len() - 1;
    if rest_len <= budget {
        return words.len();
    }

    let mut used = char_len(words[start]);
    let mut end = start + 1;
    while end < words.len() {
        let next = used + 1 + char_len(words[end]);
        if next + MARKER_LEN > budget {
            break;
        }
        used = next;
        end += 1;
    }
    end
}

fn mention_prefix(mentions: &[String]) -> String {
    if mentions.is_empty() {
        return String::new();
    }
    format!("{} ", mentions.join(" "))
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
