/// The public profile of another wallet user, as shared by the backend.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublicProfile {
    /// Local id. `None` until persisted.
    pub id: Option<i64>,
    pub hid: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
}

impl PublicProfile {
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct User {
    pub hid: i64,
    /// Currency code amounts are shown in by default.
    pub primary_currency: String,
    pub profile: Option<PublicProfile>,
}
