use crate::models::UserProfile;

/// True when both profiles have liked each other
#[inline]
pub fn is_mutual(viewer: &UserProfile, other: &UserProfile) -> bool {
    viewer.id != other.id
        && viewer.like_ids.contains(&other.id)
        && other.like_ids.contains(&viewer.id)
}

/// Resolve the viewer's mutual matches from the profiles they liked
///
/// `liked` must carry each profile's own like set. Profiles the viewer did
/// not like are ignored even if they liked the viewer. Output is sorted by
/// profile id.
pub fn resolve_mutual_matches(viewer: &UserProfile, liked: Vec<UserProfile>) -> Vec<UserProfile> {
    let mut matches: Vec<UserProfile> = liked
        .into_iter()
        .filter(|other| is_mutual(viewer, other))
        .collect();

    matches.sort_by_key(|p| p.id);
    matches.dedup_by_key(|p| p.id);
    matches
}
