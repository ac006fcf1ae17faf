use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Does not touch the db or MailChimp; 200 only means the server is up.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
