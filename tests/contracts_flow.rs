mod common;

use std::str::FromStr;

use anyhow::Result;
use axum::http::StatusCode;
use bigdecimal::BigDecimal;
use common::{acquire_db_lock, json_body, TestApp};
use contract_approval::roles::Role;
use serde_json::{json, Value};
use uuid::Uuid;

struct Parties {
    legal_token: String,
    finance_token: String,
    client_id: Uuid,
    client_token: String,
}

async fn mapped_parties(app: &TestApp) -> Result<Parties> {
    let (legal_id, legal_token) = app.user_with_token("legal", Role::LegalUser).await?;
    let (finance_id, finance_token) = app
        .user_with_token("finance", Role::FinanceReviewer)
        .await?;
    let (client_id, client_token) = app.user_with_token("client", Role::Client).await?;
    app.insert_mapping(legal_id, finance_id, client_id).await?;
    Ok(Parties {
        legal_token,
        finance_token,
        client_id,
        client_token,
    })
}

async fn create_contract(app: &TestApp, parties: &Parties, amount: i64) -> Result<Value> {
    let response = app
        .post_json(
            "/contracts",
            &json!({
                "contractName": "MSA-1",
                "clientId": parties.client_id,
                "effectiveDate": "2026-01-01",
                "contractAmount": amount,
            }),
            Some(&parties.legal_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

fn amount_of(view: &Value) -> BigDecimal {
    let raw = match &view["contractAmount"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    BigDecimal::from_str(&raw).unwrap_or_default()
}

#[tokio::test]
async fn reject_edit_resubmit_approve_scenario() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };
    let parties = mapped_parties(&app).await?;

    let created = create_contract(&app, &parties, 1000).await?;
    assert_eq!(created["status"], "DRAFT");
    assert_eq!(created["versionNumber"], 1);
    assert_eq!(created["remarks"], "Initial version");
    assert_eq!(created["clientUsername"], "client");
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let response = app
        .post(&format!("/contracts/{id}/submit"), Some(&parties.legal_token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?["status"], "PENDING_APPROVAL");

    let response = app
        .post(
            &format!("/contracts/{id}/reject?remarks=missing%20signature"),
            Some(&parties.finance_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let rejected = json_body(response).await?;
    assert_eq!(rejected["status"], "REJECTED");
    assert_eq!(rejected["remarks"], "missing signature");

    let response = app
        .put_json(
            &format!("/contracts/{id}"),
            &json!({
                "contractName": "MSA-1",
                "effectiveDate": "2026-01-01",
                "contractAmount": 1200,
            }),
            Some(&parties.legal_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let edited = json_body(response).await?;
    assert_eq!(edited["status"], "REJECTED");
    assert_eq!(edited["versionNumber"], 1);
    assert_eq!(amount_of(&edited), BigDecimal::from(1200));

    let response = app
        .post(&format!("/contracts/{id}/submit"), Some(&parties.legal_token))
        .await?;
    assert_eq!(json_body(response).await?["status"], "PENDING_APPROVAL");

    let response = app
        .get("/contracts/approval-queue", Some(&parties.finance_token))
        .await?;
    let queue = json_body(response).await?;
    assert_eq!(queue.as_array().map(Vec::len), Some(1));

    let response = app
        .post(&format!("/contracts/{id}/approve"), Some(&parties.finance_token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?["status"], "APPROVED");

    // approved is terminal
    let response = app
        .post(&format!("/contracts/{id}/submit"), Some(&parties.legal_token))
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .get("/contracts/all-active", Some(&parties.client_token))
        .await?;
    let active = json_body(response).await?;
    assert_eq!(active.as_array().map(Vec::len), Some(1));
    assert_eq!(active[0]["id"], id.as_str());

    let response = app
        .get(&format!("/contracts/{id}"), Some(&parties.client_token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = json_body(response).await?;
    assert_eq!(detail["history"].as_array().map(Vec::len), Some(1));
    let actions: Vec<&str> = detail["audit"]
        .as_array()
        .map(|entries| entries.iter().filter_map(|e| e["action"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(
        actions,
        [
            "CREATE_CONTRACT",
            "SUBMIT",
            "REJECT",
            "EDIT_CONTRACT",
            "SUBMIT",
            "APPROVE"
        ]
    );

    let response = app
        .get("/contracts/stats", Some(&parties.legal_token))
        .await?;
    let stats = json_body(response).await?;
    assert_eq!(stats["role"], "LEGAL_USER");
    assert_eq!(stats["counters"]["Contracts Created"], 1);
    assert_eq!(stats["counters"]["Approved"], 1);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn unmapped_reviewer_cannot_approve() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };
    let parties = mapped_parties(&app).await?;
    let (_, outsider_token) = app
        .user_with_token("outsider", Role::FinanceReviewer)
        .await?;

    let created = create_contract(&app, &parties, 500).await?;
    let id = created["id"].as_str().unwrap_or_default().to_string();
    app.post(&format!("/contracts/{id}/submit"), Some(&parties.legal_token))
        .await?;

    let response = app
        .post(&format!("/contracts/{id}/approve"), Some(&outsider_token))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .get("/contracts/approval-queue", Some(&outsider_token))
        .await?;
    assert_eq!(json_body(response).await?.as_array().map(Vec::len), Some(0));

    let response = app
        .get(&format!("/contracts/{id}"), Some(&parties.legal_token))
        .await?;
    let detail = json_body(response).await?;
    assert_eq!(detail["contract"]["status"], "PENDING_APPROVAL");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn negative_amounts_and_blank_reject_remarks_are_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };
    let parties = mapped_parties(&app).await?;

    let response = app
        .post_json(
            "/contracts",
            &json!({
                "contractName": "Bad",
                "clientId": parties.client_id,
                "effectiveDate": "2026-01-01",
                "contractAmount": -1,
            }),
            Some(&parties.legal_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .get("/contracts/my-contracts", Some(&parties.legal_token))
        .await?;
    assert_eq!(json_body(response).await?.as_array().map(Vec::len), Some(0));

    let created = create_contract(&app, &parties, 1000).await?;
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let response = app
        .put_json(
            &format!("/contracts/{id}"),
            &json!({
                "contractName": "MSA-1",
                "effectiveDate": "2026-01-01",
                "contractAmount": -5,
            }),
            Some(&parties.legal_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .get(&format!("/contracts/{id}"), Some(&parties.legal_token))
        .await?;
    let detail = json_body(response).await?;
    assert_eq!(amount_of(&detail["contract"]), BigDecimal::from(1000));

    app.post(&format!("/contracts/{id}/submit"), Some(&parties.legal_token))
        .await?;
    for path in [
        format!("/contracts/{id}/reject"),
        format!("/contracts/{id}/reject?remarks=%20%20"),
    ] {
        let response = app.post(&path, Some(&parties.finance_token)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .post(&format!("/contracts/{id}/approve?remarks="), Some(&parties.finance_token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let approved = json_body(response).await?;
    assert_eq!(approved["status"], "APPROVED");
    assert!(approved["remarks"].is_null());

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn legal_user_cannot_create_for_unmapped_client_or_review() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };
    let parties = mapped_parties(&app).await?;
    let (other_client, _) = app.user_with_token("other-client", Role::Client).await?;

    let response = app
        .post_json(
            "/contracts",
            &json!({
                "contractName": "Side deal",
                "clientId": other_client,
                "effectiveDate": "2026-02-01",
                "contractAmount": 10,
            }),
            Some(&parties.legal_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let created = create_contract(&app, &parties, 10).await?;
    let id = created["id"].as_str().unwrap_or_default().to_string();
    app.post(&format!("/contracts/{id}/submit"), Some(&parties.legal_token))
        .await?;

    let response = app
        .post(&format!("/contracts/{id}/approve"), Some(&parties.legal_token))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .get("/contracts/all-active", Some(&parties.legal_token))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .get("/contracts/mapped-clients", Some(&parties.legal_token))
        .await?;
    let clients = json_body(response).await?;
    assert_eq!(clients.as_array().map(Vec::len), Some(1));
    assert_eq!(clients[0]["username"], "client");

    let response = app
        .get("/contracts/approval-queue", Some(&parties.client_token))
        .await?;
    assert_eq!(json_body(response).await?.as_array().map(Vec::len), Some(1));

    let response = app
        .get(&format!("/contracts/{}", Uuid::new_v4()), Some(&parties.legal_token))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}
