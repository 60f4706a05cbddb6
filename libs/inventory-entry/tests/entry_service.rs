use std::sync::Arc;

use backend_memory::{MemoryBackend, MemoryUser};
use inventory_entry::{Attachment, EditForm, EntryError, EntryService, InventoryForm};
use tender_api::{
    AuthProvider, BackendClient, ErrorKind, MovementType, RecordQuery, RecordReader,
};

const TABLE: &str = "inventory_logs";
const BUCKET: &str = "inventory-files";

async fn setup() -> (Arc<MemoryBackend>, EntryService) {
    let backend = Arc::new(MemoryBackend::default());
    for email in ["asha@example.com", "ravi@example.com"] {
        backend
            .register_user(MemoryUser {
                email: email.into(),
                password: "pw".into(),
                full_name: None,
                role: None,
                avatar_url: None,
            })
            .await
            .unwrap();
    }
    let service = EntryService::new(BackendClient::from_backend(backend.clone()), TABLE, BUCKET);
    (backend, service)
}

fn form(material: &str) -> InventoryForm {
    InventoryForm {
        material_name: material.into(),
        quantity: "12".into(),
        unit: "bags".into(),
        ..Default::default()
    }
}

async fn row_count(backend: &MemoryBackend) -> usize {
    backend.fetch_recent(&RecordQuery::recent(TABLE, 100)).await.unwrap().len()
}

#[tokio::test]
async fn submit_requires_a_session() {
    let (backend, service) = setup().await;
    let receipt = Attachment::new("bill.pdf", "application/pdf", b"%PDF".to_vec());

    let err = service.submit(&form("Cement"), Some(&receipt), &[]).await.unwrap_err();
    assert!(matches!(err, EntryError::Unauthenticated));
    assert_eq!(row_count(&backend).await, 0);
}

#[tokio::test]
async fn invalid_form_is_reported_before_auth() {
    let (_backend, service) = setup().await;
    let err = service.submit(&form(" "), None, &[]).await.unwrap_err();
    assert_eq!(err.to_string(), "Material name is required.");
}

#[tokio::test]
async fn submit_uploads_attachments_and_stamps_owner() {
    let (backend, service) = setup().await;
    let session = backend.sign_in_with_password("asha@example.com", "pw").await.unwrap();

    let receipt = Attachment::new("bill 7.pdf", "application/pdf", b"%PDF".to_vec());
    let photos = vec![
        Attachment::new("truck.jpg", "image/jpeg", vec![1, 2, 3]),
        Attachment::new("gate.png", "image/png", vec![4, 5]),
    ];
    let mut f = form("Cement Bag");
    f.movement_type = MovementType::Out;
    f.set_contact_phone("98765 43210");

    let record = service.submit(&f, Some(&receipt), &photos).await.unwrap();
    assert_eq!(record.created_by.as_deref(), Some(session.user.id.as_str()));
    assert_eq!(record.movement(), MovementType::Out);
    assert_eq!(record.contact_phone.as_deref(), Some("9876543210"));

    let receipt_url = record.receipt_url.clone().unwrap();
    let prefix = format!("https://storage.local/object/public/{BUCKET}/");
    assert!(receipt_url.starts_with(&prefix));
    assert!(receipt_url.ends_with("-bill_7.pdf"));

    let photo_urls = record.photo_urls.clone().unwrap();
    assert_eq!(photo_urls.len(), 2);
    let path = photo_urls[0].strip_prefix(&prefix).unwrap();
    let stored = backend.object(BUCKET, path).await.unwrap();
    assert_eq!(stored.content_type, "image/jpeg");
    assert_eq!(stored.bytes, vec![1, 2, 3]);
}

#[tokio::test]
async fn no_photos_means_null_column() {
    let (backend, service) = setup().await;
    backend.sign_in_with_password("asha@example.com", "pw").await.unwrap();

    let record = service.submit(&form("Sand"), None, &[]).await.unwrap();
    assert!(record.photo_urls.is_none());
    assert!(record.receipt_url.is_none());
}

#[tokio::test]
async fn rejected_attachment_aborts_before_upload() {
    let (backend, service) = setup().await;
    backend.sign_in_with_password("asha@example.com", "pw").await.unwrap();

    let photos = vec![Attachment::new("scan.pdf", "application/pdf", vec![0])];
    let err = service.submit(&form("Sand"), None, &photos).await.unwrap_err();
    assert!(matches!(err, EntryError::Attachment(_)));
    assert_eq!(row_count(&backend).await, 0);
}

#[tokio::test]
async fn missing_table_gets_dedicated_error() {
    let (backend, _) = setup().await;
    backend.sign_in_with_password("asha@example.com", "pw").await.unwrap();
    let service = EntryService::new(BackendClient::from_backend(backend.clone()), "inventory_log", BUCKET);

    let err = service.submit(&form("Sand"), None, &[]).await.unwrap_err();
    match err {
        EntryError::TableMissing { table } => assert_eq!(table, "inventory_log"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn edit_and_delete_only_own_rows() {
    let (backend, service) = setup().await;
    backend.sign_in_with_password("asha@example.com", "pw").await.unwrap();
    let record = service.submit(&form("Sand"), None, &[]).await.unwrap();

    let edit = EditForm {
        material_name: "River Sand".into(),
        quantity: "15".into(),
        unit: "tonnes".into(),
        movement_type: MovementType::In,
        remarks: "recounted".into(),
    };
    let edited = service.edit(record.id, &edit).await.unwrap();
    assert_eq!(edited.material_name.as_deref(), Some("River Sand"));
    assert_eq!(edited.quantity, Some(15.0));

    backend.sign_out().await.unwrap();
    backend.sign_in_with_password("ravi@example.com", "pw").await.unwrap();
    match service.delete(record.id).await.unwrap_err() {
        EntryError::Backend(e) => assert_eq!(e.kind(), ErrorKind::Denied),
        other => panic!("unexpected error: {other:?}"),
    }

    backend.sign_out().await.unwrap();
    backend.sign_in_with_password("asha@example.com", "pw").await.unwrap();
    service.delete(record.id).await.unwrap();
    assert_eq!(row_count(&backend).await, 0);
}
