use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;
use access_requests::{create_access_request, list_access_requests, respond_to_access_request};
use files::serve_answer_file;
use permissions::{list_access_grants, revoke_access};
use submissions::{
    create_submission, delete_submission, get_visible_answers, list_submissions, update_submission,
};

mod access_requests;
mod files;
mod health_check;
mod permissions;
mod submissions;

use crate::routes::health_check::*;

fn access_routes() -> Scope {
    scope("access")
        .service(create_access_request)
        .service(respond_to_access_request)
        .service(list_access_requests)
        .service(revoke_access)
        .service(list_access_grants)
}

fn submissions_routes() -> Scope {
    scope("submissions")
        .service(create_submission)
        .service(list_submissions)
        .service(get_visible_answers)
        .service(serve_answer_file)
        .service(update_submission)
        .service(delete_submission)
}

fn util_routes() -> Scope {
    scope("").service(health_check)
}

pub fn factory_link_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(access_routes())
            .service(submissions_routes())
            .service(util_routes()),
    );
}
