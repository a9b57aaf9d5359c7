/// Length, in characters, of the longest contiguous run shared by `a` and `b`.
///
/// Case-sensitive exact comparison of Unicode scalar values.
pub fn longest_common_substring(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    lcs_chars(&a, &b)
}

/// Dynamic-programming core over pre-split characters, two rolling rows.
pub(crate) fn lcs_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Iterate the longer side in the outer loop so the rows stay short.
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];
    let mut best = 0;

    for &oc in outer {
        for (j, &ic) in inner.iter().enumerate() {
            curr[j + 1] = if oc == ic { prev[j] + 1 } else { 0 };
            best = best.max(curr[j + 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}
