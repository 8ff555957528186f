// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateQuery, Dialog, DialogId, Gender, Message, MessageId, ProfileChanges, ProfileId, User,
    UserChanges, UserId, UserProfile,
};
pub use requests::{field_errors, FeedQuery, FieldErrors, LoginQuery, ProfileForm, UserForm, UserFormView};
pub use responses::{
    ChatLandingPage, ContactPage, ErrorResponse, FeedPage, HealthResponse, LoginPage,
    MatchListPage, MessagesPage, ProfileCard, ProfileFormPage, ProfilePage, RoomPage,
    UserFormPage,
};
