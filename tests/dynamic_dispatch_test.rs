use chrono::NaiveDate;
use joda_payments::application::enrollment;
use joda_payments::application::lifecycle::PaymentLifecycle;
use joda_payments::domain::payment::{PaymentField, PaymentStatus};
use joda_payments::domain::ports::PaymentStoreBox;
use joda_payments::domain::product::ProductType;
use joda_payments::infrastructure::in_memory::InMemoryPaymentStore;

#[tokio::test]
async fn test_store_as_trait_object() {
    let store: PaymentStoreBox = Box::new(InMemoryPaymentStore::new());
    let enrolled_on = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    // Verify Send + Sync by moving the boxed store into a task
    let handle = tokio::spawn(async move {
        enrollment::enroll(store.as_ref(), "stu-1", ProductType::Scholarship, enrolled_on)
            .await
            .unwrap();
        store
            .query_by_field(PaymentField::StudentId("stu-1".into()))
            .await
            .unwrap()
    });

    let records = handle.await.unwrap();
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn test_shared_store_between_tasks() {
    let store = InMemoryPaymentStore::new();
    let enrolled_on = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            enrollment::enroll(&store, &format!("stu-{i}"), ProductType::EnglishCourse, enrolled_on)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_complete());
    }

    let lifecycle = PaymentLifecycle::new(Box::new(store));
    let today = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
    let all = lifecycle.refresh_all(today).await.unwrap();
    assert_eq!(all.len(), 40);
    assert_eq!(
        all.iter().filter(|r| r.status == PaymentStatus::Overdue).count(),
        10
    );
}
