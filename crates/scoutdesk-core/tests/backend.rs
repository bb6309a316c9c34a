//! Backend client tests against a mock PostgREST-style server.

use chrono::NaiveDate;
use scoutdesk_core::api::{ApiClient, ApiError, GeocodeClient, Receipt};
use scoutdesk_core::models::{
    ActividadExterior, CompraRegistro, DocumentoAutorizacion, EstadoAutorizacion, EstadoItem,
    ItemLogistica, Patrulla, Rama, Scout,
};
use scoutdesk_core::validation::ValidationError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "anon-key";

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), API_KEY)
        .expect("client")
        .with_token("user-token".to_string())
}

#[tokio::test]
async fn list_sends_keys_and_default_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/scouts"))
        .and(query_param("select", "*"))
        .and(query_param("order", "apellidos.asc"))
        .and(header("apikey", API_KEY))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "nombres": "Lucía", "apellidos": "Paredes", "rama": "TROPA", "estado": "ACTIVO"},
            {"id": 2, "nombres": "Mateo", "apellidos": "Quispe", "rama": "MANADA", "estado": "ACTIVO", "patrulla_id": 4}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let scouts: Vec<Scout> = client(&server).list().await.expect("list");
    assert_eq!(scouts.len(), 2);
    assert_eq!(scouts[0].rama, Rama::Tropa);
    assert_eq!(scouts[1].patrulla_id, Some(4));
}

#[tokio::test]
async fn anonymous_requests_use_api_key_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patrullas"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let anon = ApiClient::new(&server.uri(), API_KEY).expect("client");
    let patrullas: Vec<Patrulla> = anon.list().await.expect("list");
    assert!(patrullas.is_empty());
}

#[tokio::test]
async fn insert_returns_created_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patrullas"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 9, "nombre": "Cóndores", "rama": "TROPA", "activa": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let nueva = Patrulla {
        nombre: "Cóndores".to_string(),
        rama: Rama::Tropa,
        activa: true,
        ..Default::default()
    };
    let created = client(&server).save(&nueva).await.expect("insert");
    assert_eq!(created.id, Some(9));
    assert_eq!(created.nombre, "Cóndores");
}

#[tokio::test]
async fn invalid_record_never_reaches_backend() {
    let server = MockServer::start().await;
    let scout = Scout {
        nombres: "  ".to_string(),
        apellidos: "Paredes".to_string(),
        email: Some("no-es-un-correo".to_string()),
        ..Default::default()
    };

    let err = client(&server).insert(&scout).await.expect_err("must fail");
    match err.downcast_ref::<ValidationError>() {
        Some(ValidationError::Invalid(errors)) => {
            assert!(errors.get("nombres").is_some());
            assert!(errors.get("email").is_some());
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn status_codes_map_to_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/scouts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/patrullas"))
        .respond_with(ResponseTemplate::new(409).set_body_string("still referenced"))
        .mount(&server)
        .await;

    let api = client(&server);
    let err = api.list::<Scout>().await.expect_err("401");
    assert!(matches!(
        err.chain().find_map(|e| e.downcast_ref::<ApiError>()),
        Some(ApiError::Unauthorized)
    ));

    let err = api.delete::<Patrulla>(3).await.expect_err("409");
    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Conflict(_))));
}

#[tokio::test]
async fn delete_patrulla_unassigns_scouts_first() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/scouts"))
        .and(query_param("patrulla_id", "eq.4"))
        .and(body_json(json!({"patrulla_id": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "nombres": "A", "apellidos": "B"},
            {"id": 2, "nombres": "C", "apellidos": "D"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/patrullas"))
        .and(query_param("id", "eq.4"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/subcampo_patrullas"))
        .and(query_param("patrulla_id", "eq.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "actividad_id": 1, "subcampo_id": 3, "patrulla_id": 4}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let unassigned = client(&server).delete_patrulla(4).await.expect("delete");
    assert_eq!(unassigned, 2);

    let requests = server.received_requests().await.expect("recording enabled");
    let calls: Vec<(&str, &str)> = requests
        .iter()
        .map(|r| (r.method.as_str(), r.url.path()))
        .collect();
    assert_eq!(
        calls,
        [
            ("PATCH", "/rest/v1/scouts"),
            ("DELETE", "/rest/v1/subcampo_patrullas"),
            ("DELETE", "/rest/v1/patrullas"),
        ]
    );
}

#[tokio::test]
async fn delete_subcampo_clears_assignments_first() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/subcampo_patrullas"))
        .and(query_param("subcampo_id", "eq.3"))
        .and(body_json(json!({"subcampo_id": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "actividad_id": 1, "subcampo_id": null, "patrulla_id": 4},
            {"id": 10, "actividad_id": 1, "subcampo_id": null, "patrulla_id": 5}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/subcampos"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let cleared = client(&server).delete_subcampo(3).await.expect("delete");
    assert_eq!(cleared, 2);

    let requests = server.received_requests().await.expect("recording enabled");
    let methods: Vec<&str> = requests.iter().map(|r| r.method.as_str()).collect();
    assert_eq!(methods, ["PATCH", "DELETE"]);
}

#[tokio::test]
async fn toggle_sends_only_status_field() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/items_logistica"))
        .and(query_param("id", "eq.7"))
        .and(body_json(json!({"estado": "LISTO"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "actividad_id": 1, "descripcion": "Carpas", "estado": "LISTO"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let item = ItemLogistica {
        id: Some(7),
        actividad_id: 1,
        descripcion: "Carpas".to_string(),
        ..Default::default()
    };
    let estado = client(&server).toggle_logistica(&item).await.expect("toggle");
    assert_eq!(estado, EstadoItem::Listo);
}

#[tokio::test]
async fn advancing_authorization_stamps_send_date() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/documentos_autorizacion"))
        .and(body_json(json!({
            "estado": "ENVIADA",
            "fecha_envio": "2024-03-10",
            "fecha_firma": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "actividad_id": 1, "scout_id": 2, "estado": "ENVIADA", "fecha_envio": "2024-03-10"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let documento = DocumentoAutorizacion {
        id: Some(5),
        actividad_id: 1,
        scout_id: 2,
        ..Default::default()
    };
    let today = NaiveDate::from_ymd_opt(2024, 3, 10).expect("date");
    let cambio = client(&server)
        .advance_autorizacion(&documento, today)
        .await
        .expect("advance");
    assert_eq!(cambio.estado, EstadoAutorizacion::Enviada);
    assert_eq!(cambio.fecha_envio, Some(today));
}

#[tokio::test]
async fn purchase_is_saved_when_receipt_upload_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/documentos/comprobantes/.+\.jpg$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("bucket offline"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/compras"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 12, "actividad_id": 1, "descripcion": "Gas", "monto": 45.5}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let compra = CompraRegistro {
        actividad_id: 1,
        descripcion: "Gas".to_string(),
        monto: 45.5,
        ..Default::default()
    };
    let receipt = Receipt {
        file_name: "boleta.jpg".to_string(),
        bytes: vec![0xFF, 0xD8, 0xFF],
    };
    let outcome = client(&server)
        .register_purchase(&compra, Some(receipt), "documentos", false)
        .await
        .expect("purchase");

    assert_eq!(outcome.compra.id, Some(12));
    assert!(outcome.compra.comprobante_url.is_none());
    assert!(outcome.receipt_warning.is_some());
    assert!(outcome.item_warning.is_none());
}

#[tokio::test]
async fn uploaded_receipt_url_is_public() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/documentos/comprobantes/\d+_[a-z0-9]{8}\.png$"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "ok"})))
        .mount(&server)
        .await;

    let url = client(&server)
        .upload("documentos", "comprobantes", "ticket.PNG", vec![1, 2, 3])
        .await
        .expect("upload");
    let prefix = format!("{}/storage/v1/object/public/documentos/comprobantes/", server.uri());
    assert!(url.starts_with(&prefix), "{}", url);
    assert!(url.ends_with(".png"));
}

#[tokio::test]
async fn sign_in_returns_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", API_KEY))
        .and(body_json(json!({"email": "jefe@grupo.pe", "password": "secreto"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "abc.def",
            "expires_in": 7200,
            "user": {"id": "5f1c", "email": "jefe@grupo.pe"}
        })))
        .mount(&server)
        .await;

    let anon = ApiClient::new(&server.uri(), API_KEY).expect("client");
    let session = anon.authenticate("jefe@grupo.pe", "secreto").await.expect("sign in");
    assert_eq!(session.token, "abc.def");
    assert_eq!(session.user_id, "5f1c");
    assert_eq!(session.expires_in, 7200);
    assert!(!session.is_expired());
}

#[tokio::test]
async fn missing_profile_is_read_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/perfiles"))
        .and(query_param("user_id", "eq.5f1c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let permisos = client(&server).fetch_permisos("5f1c").await.expect("profile");
    assert!(permisos.is_read_only());
}

#[tokio::test]
async fn activity_save_survives_geocoding_failure() {
    let geo = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&geo)
        .await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/actividades"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 3, "nombre": "Campamento de verano", "fecha_inicio": "2024-02-01",
             "latitud": -12.2, "longitud": -76.9, "estado": "PLANIFICADA"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let actividad = ActividadExterior {
        nombre: "Campamento de verano".to_string(),
        fecha_inicio: NaiveDate::from_ymd_opt(2024, 2, 1),
        latitud: Some(-12.2),
        longitud: Some(-76.9),
        ..Default::default()
    };
    let geocoder = GeocodeClient::new(&geo.uri()).expect("geocoder");
    let saved = client(&server)
        .save_actividad(&actividad, Some(&geocoder))
        .await
        .expect("save");
    assert_eq!(saved.id, Some(3));
    assert!(saved.ubicacion_etiqueta.is_none());
}

#[tokio::test]
async fn reverse_geocode_shortens_display_name() {
    let geo = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "jsonv2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_name": "Huampaní, Chaclacayo, Lima, Lima Metropolitana, Perú"
        })))
        .mount(&geo)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Unable to geocode"})))
        .with_priority(1)
        .mount(&geo)
        .await;

    let geocoder = GeocodeClient::new(&geo.uri()).expect("geocoder");
    let label = geocoder.reverse(-11.98, -76.78).await.expect("reverse");
    assert_eq!(label.as_deref(), Some("Huampaní, Chaclacayo, Lima"));

    let nothing = geocoder.reverse(0.0, 0.0).await.expect("reverse");
    assert!(nothing.is_none());
}
