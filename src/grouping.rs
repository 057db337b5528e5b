use crate::models::{DisplayGroup, GroupSize, Post, PostFilter};

/// Source posts between two interstitial cards.
pub const INTERSTITIAL_EVERY: usize = 4;
pub const PREVIEW_CHARS: usize = 120;

/// Splits the loaded posts into feed rows.
///
/// The interstitial cadence counts source posts, before filtering, so a
/// filter never shifts where the breaks fall. A row cut short by a break is
/// emitted as is.
pub fn compute_groups(posts: &[Post], filter: PostFilter, group_size: GroupSize) -> Vec<DisplayGroup> {
    let size = group_size.get();
    let mut groups = Vec::new();
    let mut chunk: Vec<Post> = Vec::with_capacity(size);
    let mut rows_since_break = 0;

    for (index, post) in posts.iter().enumerate() {
        if filter.matches(post) {
            chunk.push(post.clone());
            if chunk.len() == size {
                groups.push(DisplayGroup::Posts(std::mem::take(&mut chunk)));
                rows_since_break += 1;
            }
        }

        if (index + 1) % INTERSTITIAL_EVERY == 0 {
            if !chunk.is_empty() {
                groups.push(DisplayGroup::Posts(std::mem::take(&mut chunk)));
                rows_since_break += 1;
            }
            if rows_since_break > 0 {
                groups.push(DisplayGroup::Interstitial);
                rows_since_break = 0;
            }
        }
    }

    if !chunk.is_empty() {
        groups.push(DisplayGroup::Posts(chunk));
    }
    groups
}

/// Card preview of a markdown body: cut at the last space before `max_chars`.
pub fn preview(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }

    let cut = body
        .char_indices()
        .nth(max_chars)
        .map(|(byte, _)| byte)
        .unwrap_or(body.len());
    let head = &body[..cut];
    let head = match head.rfind(' ') {
        Some(space) => &head[..space],
        None => head,
    };
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{sample_post, sample_posts};

    fn shape(groups: &[DisplayGroup]) -> Vec<String> {
        groups
            .iter()
            .map(|group| match group {
                DisplayGroup::Posts(posts) => format!("P{}", posts.len()),
                DisplayGroup::Interstitial => "I".to_string(),
            })
            .collect()
    }

    fn size(n: usize) -> GroupSize {
        GroupSize::new(n).unwrap()
    }

    #[test]
    fn eight_posts_in_pairs_break_after_every_four() {
        let groups = compute_groups(&sample_posts("p", 8), PostFilter::All, size(2));
        assert_eq!(shape(&groups), vec!["P2", "P2", "I", "P2", "P2", "I"]);
    }

    #[test]
    fn groups_keep_the_original_order() {
        let posts = sample_posts("p", 10);
        let groups = compute_groups(&posts, PostFilter::All, size(2));

        let flattened: Vec<Post> = groups
            .into_iter()
            .flat_map(|group| match group {
                DisplayGroup::Posts(posts) => posts,
                DisplayGroup::Interstitial => Vec::new(),
            })
            .collect();
        assert_eq!(flattened, posts);
    }

    #[test]
    fn rows_of_three_are_cut_at_the_break() {
        let groups = compute_groups(&sample_posts("p", 9), PostFilter::All, size(3));
        assert_eq!(shape(&groups), vec!["P3", "P1", "I", "P3", "P1", "I", "P1"]);
    }

    #[test]
    fn single_post_rows() {
        let groups = compute_groups(&sample_posts("p", 5), PostFilter::All, size(1));
        assert_eq!(shape(&groups), vec!["P1", "P1", "P1", "P1", "I", "P1"]);
    }

    #[test]
    fn cadence_counts_posts_before_filtering() {
        let posts = vec![
            sample_post("1", "[PITCH] a"),
            sample_post("2", "nada"),
            sample_post("3", "nada"),
            sample_post("4", "[PIT] b"),
            sample_post("5", "nada"),
            sample_post("6", "[PITCH] c"),
        ];

        let groups = compute_groups(&posts, PostFilter::Pitch, size(2));

        assert_eq!(shape(&groups), vec!["P2", "I", "P1"]);
    }

    #[test]
    fn no_break_without_rows_since_the_last_one() {
        let mut posts = vec![sample_post("1", "[AJUDA] a")];
        posts.extend(sample_posts("x", 7));

        let groups = compute_groups(&posts, PostFilter::Question, size(2));

        assert_eq!(shape(&groups), vec!["P1", "I"]);
    }

    #[test]
    fn empty_inputs_give_no_groups() {
        assert!(compute_groups(&[], PostFilter::All, size(2)).is_empty());
        let groups = compute_groups(&sample_posts("p", 8), PostFilter::Question, size(2));
        assert!(groups.is_empty());
    }

    #[test]
    fn compute_groups_is_deterministic() {
        let posts = sample_posts("p", 23);
        let first = compute_groups(&posts, PostFilter::All, size(3));
        let second = compute_groups(&posts, PostFilter::All, size(3));
        assert_eq!(first, second);
    }

    #[test]
    fn preview_cuts_on_a_word_boundary() {
        assert_eq!(preview("short body", 120), "short body");
        assert_eq!(preview("uma frase bem longa", 12), "uma frase...");
        assert_eq!(preview("semespacos", 4), "seme...");
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        assert_eq!(preview("ção ção ção", 8), "ção ção...");
        assert_eq!(preview("ção ção ção", 7), "ção...");
    }
}
