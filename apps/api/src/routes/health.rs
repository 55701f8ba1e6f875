/// GET /
/// Plain-text liveness string.
pub async fn liveness_handler() -> &'static str {
    "Application Form Server Running 🚀"
}
