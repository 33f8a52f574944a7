// Form resource handlers.
//
// Every handler takes the shared `AppState`, returns `Result<_, ApiError>`,
// and leaves status-code decisions to `ApiError`'s `IntoResponse`.
pub mod form;
