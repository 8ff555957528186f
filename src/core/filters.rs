use crate::models::{CandidateQuery, UserProfile};

/// Check if a profile satisfies the viewer's discovery constraints
///
/// Mirrors the SQL predicate the Postgres store applies, so both store
/// implementations and the in-process re-check agree.
#[inline]
pub fn matches_candidate_query(profile: &UserProfile, query: &CandidateQuery) -> bool {
    // Never offer the viewer to themselves
    if profile.id == query.viewer_id {
        return false;
    }

    // Already liked or skipped
    if query.exclude_ids.contains(&profile.id) {
        return false;
    }

    // Check age range (inclusive on both ends)
    if profile.age < query.min_age || profile.age > query.max_age {
        return false;
    }

    profile.gender == query.gender
}

/// Keep only the profiles passing `matches_candidate_query`, in input order
pub fn filter_candidates(query: &CandidateQuery, profiles: Vec<UserProfile>) -> Vec<UserProfile> {
    profiles
        .into_iter()
        .filter(|profile| matches_candidate_query(profile, query))
        .collect()
}
