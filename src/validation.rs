//! Free-text answer grading for the chat channel.
//!
//! Chat replies are typed by hand, so small typos are tolerated: an answer
//! is accepted when its edit-distance similarity to the expected answer
//! reaches [`SIMILARITY_THRESHOLD`].

/// Minimum similarity (0.0 to 1.0) for a reply to count as correct.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Lowercase, trim, and collapse internal whitespace runs to one space
pub fn normalize_answer(input: &str) -> String {
  input
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Verdict on a reply together with the score it was based on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grade {
  pub correct: bool,
  pub similarity: f64,
}

/// Grade a reply against the expected answer.
///
/// Never fails: two blank answers match, a single blank one does not.
pub fn grade(user_answer: &str, correct_answer: &str) -> bool {
  grade_answer(user_answer, correct_answer).correct
}

/// Like [`grade`], also reporting the similarity score.
pub fn grade_answer(user_answer: &str, correct_answer: &str) -> Grade {
  let user = normalize_answer(user_answer);
  let expected = normalize_answer(correct_answer);
  let similarity = similarity(&user, &expected);

  let correct = match (user.is_empty(), expected.is_empty()) {
    (true, true) => true,
    (true, false) | (false, true) => false,
    (false, false) => similarity >= SIMILARITY_THRESHOLD,
  };

  Grade { correct, similarity }
}

/// `1 - distance / longer length`, over chars of already-normalized input.
///
/// Two empty strings are identical and score 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
  let longest = a.chars().count().max(b.chars().count());
  if longest == 0 {
    return 1.0;
  }
  let distance = levenshtein_distance(a, b);
  // (n - d) / n rather than 1 - d / n keeps exact ratios such as 4/5 equal to the literal 0.8
  (longest - distance) as f64 / longest as f64
}

/// Single-character insert/delete/substitute edit distance
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
  let a_chars: Vec<char> = a.chars().collect();
  let b_chars: Vec<char> = b.chars().collect();

  if a_chars.is_empty() {
    return b_chars.len();
  }
  if b_chars.is_empty() {
    return a_chars.len();
  }

  // Two rolling rows instead of the full matrix
  let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
  let mut current = vec![0usize; b_chars.len() + 1];

  for (i, a_ch) in a_chars.iter().enumerate() {
    current[0] = i + 1;
    for (j, b_ch) in b_chars.iter().enumerate() {
      let cost = if a_ch == b_ch { 0 } else { 1 };
      current[j + 1] = (previous[j + 1] + 1)
        .min(current[j] + 1)
        .min(previous[j] + cost);
    }
    std::mem::swap(&mut previous, &mut current);
  }

  previous[b_chars.len()]
}
