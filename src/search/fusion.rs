//! Reciprocal-rank fusion (spec §4.9 step 5, §9's resolution of the
//! "2-list vs 3-list" open question: the three-list form is authoritative).
//! Not present in the teacher or the original (`retreival/service.py` fuses
//! nothing, it's BM25-only); implemented directly from the spec's formula.

use std::collections::HashMap;
use std::hash::Hash;

pub const RRF_K: f64 = 60.0;

/// `score(s) = Σ_l 1 / (k + rank_l(s))`, rank 1-based, absent contributes 0
/// (spec §4.9). Each list is assumed already ranked best-first.
pub fn reciprocal_rank_fusion<T: Eq + Hash + Copy>(lists: &[Vec<T>], k: f64) -> HashMap<T, f64> {
    let mut scores: HashMap<T, f64> = HashMap::new();
    for list in lists {
        for (idx, item) in list.iter().enumerate() {
            let rank = (idx + 1) as f64;
            *scores.entry(*item).or_insert(0.0) += 1.0 / (k + rank);
        }
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_rank_sums_agree_across_permutations() {
        let a = vec![1, 2, 3];
        let b = vec![2, 3, 1];
        let c = vec![3, 1, 2];
        let scores = reciprocal_rank_fusion(&[a, b, c], RRF_K);
        let s1 = scores[&1];
        let s2 = scores[&2];
        let s3 = scores[&3];
        assert!((s1 - s2).abs() < 1e-12);
        assert!((s2 - s3).abs() < 1e-12);
    }

    #[test]
    fn fused_score_bounded_by_k_over_k_plus_one() {
        let lists = vec![vec![1], vec![1], vec![1]];
        let scores = reciprocal_rank_fusion(&lists, RRF_K);
        let bound = 3.0 / (RRF_K + 1.0);
        assert!(scores[&1] > 0.0 && scores[&1] < bound);
    }

    #[test]
    fn absent_from_a_list_contributes_zero() {
        let lists = vec![vec![1, 2], vec![2]];
        let scores = reciprocal_rank_fusion(&lists, RRF_K);
        assert!(scores[&1] < scores[&2]);
    }
}
