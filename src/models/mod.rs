// Models module

pub mod assessment;
pub mod diary;
pub mod game;
pub mod message;
pub mod sound;
pub mod therapist;
pub mod user;

pub use assessment::{
    LocalizedOption, LocalizedQuestion, LocalizedQuestionnaire, StatusResponse,
    SubmitAnswersRequest, TestResult, TestResultResponse,
};
pub use diary::{
    current_streak, CreateDiaryEntryRequest, DiaryEntry, DiaryRangeQuery, MoodSummary,
};
pub use game::{
    AutoRouteRequest, AutoRouteResponse, CompleteLevelRequest, GameKind, GameProgress,
    ProgressError, ValidatePathRequest, ValidatePathResponse,
};
pub use message::{
    truncate_chars, ChatSession, CreateSessionRequest, GetMessagesQuery, Message,
    RenameSessionRequest, SendMessageRequest, SendMessageResponse, PREVIEW_LEN, TITLE_LEN,
};
pub use sound::{ListSoundsQuery, NatureSound};
pub use therapist::{GeoPoint, NearbyQuery, Therapist, TherapistDetails};
pub use user::{
    ActivityCategory, RecentActivity, RecordActivityRequest, RecordActivityResponse,
    UpdateLanguageRequest, UpdateProfileRequest, UserProfile,
};
