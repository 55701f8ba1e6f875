pub mod health;
pub mod submit;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Room for text fields and multipart framing on top of the two files.
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = match state.uploads.max_file_bytes {
        Some(max) => {
            let total = max.saturating_mul(2).saturating_add(FORM_OVERHEAD_BYTES);
            DefaultBodyLimit::max(usize::try_from(total).unwrap_or(usize::MAX))
        }
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/", get(health::liveness_handler))
        .route("/submit", post(submit::handle_submit).layer(body_limit))
        .nest_service("/uploads", ServeDir::new(&state.uploads.dir))
        .fallback_service(ServeDir::new(&state.config.public_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use image::{ImageFormat, Rgb, RgbImage};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::errors::GENERIC_FAILURE_BODY;
    use crate::recorder::memory::{MemorySubmissionStore, UnavailableStore};
    use crate::recorder::SubmissionStore;
    use crate::render::inspect::{draws_image, page_operations, page_texts, rectangles};

    const BOUNDARY: &str = "----appform-test-boundary";

    struct FilePart<'a> {
        field: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: Vec<u8>,
    }

    struct Harness {
        uploads: TempDir,
        public: TempDir,
        store: Arc<MemorySubmissionStore>,
        app: Router,
    }

    fn harness(configure: impl FnOnce(&mut Config)) -> Harness {
        let uploads = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let mut config =
            Config::for_tests(uploads.path().to_path_buf(), public.path().to_path_buf());
        configure(&mut config);

        let store = Arc::new(MemorySubmissionStore::default());
        let app = build_router(AppState::new(store.clone(), config));
        Harness {
            uploads,
            public,
            store,
            app,
        }
    }

    fn multipart_body(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for file in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    file.field, file.file_name, file.content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(&file.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn submit_request(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/submit")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, files)))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn png_bytes() -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbImage::from_pixel(12, 14, Rgb([10, 120, 200]))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    const ASHA: &[(&str, &str)] = &[
        ("fullname", "Asha Rao"),
        ("email", "a@x.com"),
        ("phone", "9999999999"),
    ];

    // ── GET / ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_liveness() {
        let h = harness(|_| {});
        let response = h
            .app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(
            body_bytes(response).await,
            "Application Form Server Running 🚀".as_bytes()
        );
    }

    // ── POST /submit ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_submit_without_files_returns_pdf() {
        let h = harness(|_| {});
        let response = h.app.oneshot(submit_request(ASHA, &[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=ApplicationForm.pdf"
        );

        let bytes = body_bytes(response).await;
        let pages = page_texts(&bytes);
        assert_eq!(pages.len(), 2);
        for line in ["Full Name: Asha Rao", "Email: a@x.com", "Phone: 9999999999"] {
            assert!(pages[0].contains(&line.to_string()), "missing {line}");
        }
        let ops = page_operations(&bytes);
        assert!(rectangles(&ops[0]).is_empty());
        assert!(!draws_image(&ops[0]));

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("fullname"), "Asha Rao");
        assert_eq!(records[0].field("photo"), "");
        assert_eq!(records[0].field("resume"), "");
        assert!(files_in(h.uploads.path()).is_empty());
    }

    #[tokio::test]
    async fn test_submit_with_photo_and_resume() {
        let h = harness(|_| {});
        let files = [
            FilePart {
                field: "photo",
                file_name: "asha.png",
                content_type: "image/png",
                data: png_bytes(),
            },
            FilePart {
                field: "resume",
                file_name: "cv.pdf",
                content_type: "application/pdf",
                data: b"%PDF-1.4 fake".to_vec(),
            },
        ];
        let response = h.app.oneshot(submit_request(ASHA, &files)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let ops = page_operations(&body_bytes(response).await);
        assert_eq!(rectangles(&ops[0]).len(), 1);
        assert!(draws_image(&ops[0]));

        let records = h.store.records();
        let record = &records[0];
        let photo = record.field("photo").to_string();
        let resume = record.field("resume").to_string();
        assert!(photo.ends_with("-asha.png"), "photo = {photo}");
        assert!(resume.ends_with("-cv.pdf"), "resume = {resume}");
        assert_eq!(files_in(h.uploads.path()), {
            let mut expected = vec![photo, resume];
            expected.sort();
            expected
        });
    }

    #[tokio::test]
    async fn test_uploaded_attachment_is_served_back() {
        let h = harness(|_| {});
        let files = [FilePart {
            field: "resume",
            file_name: "cv.pdf",
            content_type: "application/pdf",
            data: b"%PDF-1.4 fake".to_vec(),
        }];
        let response = h
            .app
            .clone()
            .oneshot(submit_request(ASHA, &files))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = h.store.records()[0].field("resume").to_string();
        let response = h
            .app
            .oneshot(
                Request::get(format!("/uploads/{stored}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn test_identical_submissions_are_not_merged() {
        let h = harness(|_| {});
        for _ in 0..2 {
            let files = [FilePart {
                field: "photo",
                file_name: "asha.png",
                content_type: "image/png",
                data: png_bytes(),
            }];
            let response = h
                .app
                .clone()
                .oneshot(submit_request(ASHA, &files))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let records = h.store.records();
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id, records[1].id);
        assert_ne!(records[0].field("photo"), records[1].field("photo"));
        assert_eq!(files_in(h.uploads.path()).len(), 2);
    }

    #[tokio::test]
    async fn test_empty_file_input_is_ignored() {
        let h = harness(|_| {});
        let files = [FilePart {
            field: "photo",
            file_name: "",
            content_type: "application/octet-stream",
            data: Vec::new(),
        }];
        let response = h.app.oneshot(submit_request(ASHA, &files)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.store.records()[0].field("photo"), "");
        assert!(files_in(h.uploads.path()).is_empty());
    }

    #[tokio::test]
    async fn test_text_resume_rejected_when_mime_filter_enabled() {
        let h = harness(|config| config.upload_mime_filter = true);
        let files = [FilePart {
            field: "resume",
            file_name: "notes.txt",
            content_type: "text/plain",
            data: b"hello".to_vec(),
        }];
        let response = h.app.oneshot(submit_request(ASHA, &files)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_bytes(response).await, GENERIC_FAILURE_BODY.as_bytes());
        assert!(h.store.records().is_empty());
        assert!(files_in(h.uploads.path()).is_empty());
    }

    #[tokio::test]
    async fn test_text_resume_accepted_without_mime_filter() {
        let h = harness(|_| {});
        let files = [FilePart {
            field: "resume",
            file_name: "notes.txt",
            content_type: "text/plain",
            data: b"hello".to_vec(),
        }];
        let response = h.app.oneshot(submit_request(ASHA, &files)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(h.store.records()[0].field("resume").ends_with("-notes.txt"));
    }

    #[tokio::test]
    async fn test_rejection_removes_files_from_earlier_parts() {
        let h = harness(|config| config.upload_mime_filter = true);
        let files = [
            FilePart {
                field: "photo",
                file_name: "asha.png",
                content_type: "image/png",
                data: png_bytes(),
            },
            FilePart {
                field: "resume",
                file_name: "notes.txt",
                content_type: "text/plain",
                data: b"hello".to_vec(),
            },
        ];
        let response = h.app.oneshot(submit_request(ASHA, &files)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(h.store.records().is_empty());
        assert!(files_in(h.uploads.path()).is_empty());
    }

    #[tokio::test]
    async fn test_oversize_file_rejected() {
        let h = harness(|config| config.upload_max_file_bytes = Some(16));
        let files = [FilePart {
            field: "resume",
            file_name: "cv.pdf",
            content_type: "application/pdf",
            data: vec![b'x'; 64],
        }];
        let response = h.app.oneshot(submit_request(ASHA, &files)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(h.store.records().is_empty());
        assert!(files_in(h.uploads.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_file_field_rejected() {
        let h = harness(|_| {});
        let files = [FilePart {
            field: "avatar",
            file_name: "asha.png",
            content_type: "image/png",
            data: png_bytes(),
        }];
        let response = h.app.oneshot(submit_request(ASHA, &files)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(h.store.records().is_empty());
    }

    fn body_request(content_type: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/submit")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_urlencoded_submission_returns_pdf() {
        let h = harness(|_| {});
        let request = body_request(
            "application/x-www-form-urlencoded",
            "fullname=Asha+Rao&email=a%40x.com&phone=9999999999&email=b%40x.com",
        );
        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let pages = page_texts(&body_bytes(response).await);
        assert!(pages[0].contains(&"Full Name: Asha Rao".to_string()));
        assert!(pages[0].contains(&"Email: b@x.com".to_string()));

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("phone"), "9999999999");
        assert_eq!(records[0].field("photo"), "");
        assert_eq!(records[0].field("resume"), "");
    }

    #[tokio::test]
    async fn test_json_submission_returns_pdf() {
        let h = harness(|_| {});
        let request = body_request(
            "application/json",
            r#"{"fullname":"Asha Rao","email":"a@x.com","yearsOfWork":3}"#,
        );
        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let pages = page_texts(&body_bytes(response).await);
        assert!(pages[0].contains(&"Full Name: Asha Rao".to_string()));
        assert!(pages[0].contains(&"Years of Work: 3".to_string()));

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("email"), "a@x.com");
        assert_eq!(records[0].field("photo"), "");
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let h = harness(|_| {});
        let response = h
            .app
            .oneshot(body_request("application/json", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(h.store.records().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognised_body_records_empty_submission() {
        let h = harness(|_| {});
        let response = h
            .app
            .oneshot(body_request("text/plain", "fullname=Asha Rao"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("fullname"), "");
        assert_eq!(records[0].field("photo"), "");
    }

    #[tokio::test]
    async fn test_store_unavailable_returns_generic_500() {
        let uploads = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let config = Config::for_tests(uploads.path().to_path_buf(), public.path().to_path_buf());
        let store: Arc<dyn SubmissionStore> = Arc::new(UnavailableStore);
        let app = build_router(AppState::new(store, config));

        let response = app.oneshot(submit_request(ASHA, &[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_ne!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let body = body_bytes(response).await;
        assert_eq!(body, GENERIC_FAILURE_BODY.as_bytes());
        assert!(!body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_corrupt_photo_is_recorded_but_render_fails() {
        let h = harness(|_| {});
        let files = [FilePart {
            field: "photo",
            file_name: "asha.png",
            content_type: "image/png",
            data: b"not really a png".to_vec(),
        }];
        let response = h.app.oneshot(submit_request(ASHA, &files)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_bytes(response).await, GENERIC_FAILURE_BODY.as_bytes());
        // write and render are not transactional
        assert_eq!(h.store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_logo_from_public_dir_is_drawn() {
        let h = harness(|_| {});
        std::fs::write(h.public.path().join("logo.png"), png_bytes()).unwrap();

        let response = h.app.oneshot(submit_request(ASHA, &[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let ops = page_operations(&body_bytes(response).await);
        assert!(draws_image(&ops[0]));
        assert!(rectangles(&ops[0]).is_empty());
    }
}
