use std::collections::HashMap;
use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};

use map_harvest_lib::api::{self, AppState};
use map_harvest_lib::auth::StaticTokenAuth;
use map_harvest_lib::config::{ExportConfig, GeneratorConfig};
use map_harvest_lib::contact::ContactValidator;
use map_harvest_lib::{LeadService, LeadStore, MemoryLeadStore, MockLeadSource, SqliteLeadStore};

const ALICE: &str = "Bearer alice-token";
const BOB: &str = "Bearer bob-token";

fn state() -> web::Data<AppState> {
    state_with_store(Arc::new(MemoryLeadStore::new()))
}

fn state_with_store(store: Arc<dyn LeadStore>) -> web::Data<AppState> {
    let generator = GeneratorConfig {
        delay_ms_min: 0,
        delay_ms_max: 0,
        ..GeneratorConfig::default()
    };
    let service = LeadService::new(
        Arc::new(MockLeadSource::seeded(&generator, 11)),
        store,
        ContactValidator::new().unwrap(),
        100,
    );
    let auth = StaticTokenAuth::new(HashMap::from([
        ("alice-token".to_string(), "alice".to_string()),
        ("bob-token".to_string(), "bob".to_string()),
    ]));
    web::Data::new(AppState::new(service, Arc::new(auth), ExportConfig::default()))
}

fn sample_leads(n: usize) -> Value {
    let leads: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "name": format!("Shop {:02}", i),
                "specialty": if i % 2 == 0 { "Salon" } else { "Gym" },
                "address": format!("{}, Linking Road, Mumbai", i),
                "phoneNumber": format!("+91 97{:08}", i),
                "scrapedAt": format!("2024-02-01T10:{:02}:00Z", i),
                "searchQuery": "Salon in Mumbai",
            })
        })
        .collect();
    Value::Array(leads)
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state.clone()).configure(api::configure)).await
    };
}

#[actix_web::test]
async fn test_health_is_public() {
    let app = app!(state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_requires_bearer_token() {
    let app = app!(state());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/leads").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header((header::AUTHORIZATION, "Bearer nope"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Authentication required");

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], "alice");
}

#[actix_web::test]
async fn test_scrape_returns_generated_leads() {
    let app = app!(state());
    let req = test::TestRequest::post()
        .uri("/api/scrape")
        .insert_header((header::AUTHORIZATION, ALICE))
        .set_json(json!({ "query": "Dentist in Mumbai", "scrollAmount": 10 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let results = body["results"].as_array().unwrap();
    assert!((30..35).contains(&results.len()));
    for lead in results {
        assert_eq!(lead["specialty"], "Dentist");
        assert!(lead["address"].as_str().unwrap().contains("Mumbai"));
        assert_eq!(lead["searchQuery"], "Dentist in Mumbai");
    }
}

#[actix_web::test]
async fn test_scrape_rejects_empty_query() {
    let app = app!(state());
    let req = test::TestRequest::post()
        .uri("/api/scrape")
        .insert_header((header::AUTHORIZATION, ALICE))
        .set_json(json!({ "query": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Search query is required");
}

#[actix_web::test]
async fn test_save_leads_validation() {
    let app = app!(state());

    let req = test::TestRequest::post()
        .uri("/api/save-leads")
        .insert_header((header::AUTHORIZATION, ALICE))
        .set_json(json!({ "userId": "alice" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/save-leads")
        .insert_header((header::AUTHORIZATION, ALICE))
        .set_json(json!({ "leads": "nope" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/save-leads")
        .insert_header((header::AUTHORIZATION, ALICE))
        .set_json(json!({ "leads": sample_leads(1), "userId": "bob" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_save_then_page_and_count() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/save-leads")
        .insert_header((header::AUTHORIZATION, ALICE))
        .set_json(json!({ "leads": sample_leads(12), "userId": "alice" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["inserted"], 12);

    // Saving again adds nothing.
    let req = test::TestRequest::post()
        .uri("/api/save-leads")
        .insert_header((header::AUTHORIZATION, ALICE))
        .set_json(json!({ "leads": sample_leads(12) }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["inserted"], 0);

    let req = test::TestRequest::get()
        .uri("/api/leads?page=2&pageSize=5&sortBy=name&direction=asc")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["count"], 12);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["page"], 2);
    let names: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Shop 05", "Shop 06", "Shop 07", "Shop 08", "Shop 09"]);

    let req = test::TestRequest::get()
        .uri("/api/leads?specialty=Gym&filter=shop%200")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    // Odd shops below ten: 01, 03, 05, 07, 09.
    assert_eq!(page["count"], 5);

    let req = test::TestRequest::get()
        .uri("/api/leads/count")
        .insert_header((header::AUTHORIZATION, BOB))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);

    let req = test::TestRequest::get()
        .uri("/api/leads/specialties")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!(["Gym", "Salon"]));

    let req = test::TestRequest::get()
        .uri("/api/leads?sortBy=rating")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_page_far_past_the_end_is_empty() {
    let stores: Vec<Arc<dyn LeadStore>> = vec![
        Arc::new(MemoryLeadStore::new()),
        Arc::new(SqliteLeadStore::open_in_memory().unwrap()),
    ];
    for store in stores {
        let state = state_with_store(store);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/save-leads")
            .insert_header((header::AUTHORIZATION, ALICE))
            .set_json(json!({ "leads": sample_leads(12) }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["inserted"], 12);

        let req = test::TestRequest::get()
            .uri("/api/leads?page=18446744073709551615&pageSize=10")
            .insert_header((header::AUTHORIZATION, ALICE))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page: Value = test::read_body_json(resp).await;
        assert_eq!(page["data"], json!([]));
        assert_eq!(page["count"], 12);
        assert_eq!(page["totalPages"], 2);
    }
}

#[actix_web::test]
async fn test_export_print_and_stats() {
    let state = state();
    let app = app!(state);
    let req = test::TestRequest::post()
        .uri("/api/save-leads")
        .insert_header((header::AUTHORIZATION, ALICE))
        .set_json(json!({ "leads": sample_leads(3) }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/leads/export")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get("Content-Disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"business-leads-"));
    let body = test::read_body(resp).await;
    let csv = std::str::from_utf8(&body).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.starts_with("\"Name\",\"Specialty\""));

    let req = test::TestRequest::get()
        .uri("/api/leads/print?searchQuery=Salon%20in%20Mumbai")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("Total leads: 3"));
    assert!(html.contains("Search query: Salon in Mumbai"));

    let req = test::TestRequest::get()
        .uri("/api/leads/by-query?q=Salon%20in%20Mumbai")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let req = test::TestRequest::get()
        .uri("/api/stats")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stats["totalUniqueLeads"], 3);
    assert_eq!(stats["uniquePhoneNumbers"], 3);
    assert_eq!(stats["uniqueQueries"], 1);
    assert_eq!(stats["recentQueries"][0]["searchQuery"], "Salon in Mumbai");
}

#[actix_web::test]
async fn test_import_csv_upload() {
    let app = app!(state());
    let csv = "Name,Specialty,Address,Phone Number\n\
               Kumar Gym,Gym,\"8, FC Road, Pune\",98765 43210\n\
               Bad Phone Gym,Gym,\"9, FC Road, Pune\",call us\n";
    let body = format!(
        "--BOUNDARY\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"leads.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {}\r\n\
         --BOUNDARY--\r\n",
        csv
    );
    let req = test::TestRequest::post()
        .uri("/api/leads/import")
        .insert_header((header::AUTHORIZATION, ALICE))
        .insert_header((header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY"))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result: Value = test::read_body_json(resp).await;
    assert_eq!(result["imported"], 2);
    assert_eq!(result["inserted"], 2);

    let req = test::TestRequest::get()
        .uri("/api/leads/by-query?q=Imported%20from%20leads.csv")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let rows: Value = test::call_and_read_body_json(&app, req).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let kumar = rows.iter().find(|r| r["name"] == "Kumar Gym").unwrap();
    assert_eq!(kumar["phoneNumber"], "+91 9876543210");
    let bad = rows.iter().find(|r| r["name"] == "Bad Phone Gym").unwrap();
    assert!(bad.get("phoneNumber").is_none());
}

#[actix_web::test]
async fn test_catalog() {
    let app = app!(state());
    let req = test::TestRequest::get()
        .uri("/api/catalog/localities/Mumbai")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(!body.as_array().unwrap().is_empty());

    let req = test::TestRequest::get()
        .uri("/api/catalog/localities/Atlantis")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/catalog/categories")
        .insert_header((header::AUTHORIZATION, ALICE))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["category"] == "Healthcare"));
}
