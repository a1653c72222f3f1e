use engine::{
    EngineError, Month, PaymentDecision, PaymentMethod, PaymentStatus, PaymentUpdate, User,
};

mod common;

async fn member_of_group(engine: &engine::Engine, name: &str) -> (User, engine::Group) {
    let user = common::user(engine, name).await;
    let group = engine
        .create_group(&user.id, "Family", 50_000, 5)
        .await
        .unwrap();
    engine.join_group(&user.id, &group.id).await.unwrap();
    (user, group)
}

#[tokio::test]
async fn qpay_settles_and_marks_the_month_paid() {
    let engine = common::engine().await;
    let (u, g) = member_of_group(&engine, "U").await;

    let payment = engine
        .submit_payment(&u.id, &g.id, PaymentMethod::Qpay, Some("june"))
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Verified);
    assert_eq!(payment.amount, 50_000);
    assert_eq!(payment.note.as_deref(), Some("june"));

    let progress = engine.progress_for(&u.id, Some(&g.id)).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].month, Month::new(2024, 6).unwrap());
    assert!(progress[0].paid);
    assert_eq!(progress[0].note.as_deref(), Some("Paid via QPay"));
}

#[tokio::test]
async fn bank_transfer_waits_and_leaves_progress_alone() {
    let engine = common::engine().await;
    let (u, g) = member_of_group(&engine, "U").await;

    let payment = engine
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert!(engine.progress_for(&u.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn non_members_cannot_pay() {
    let engine = common::engine().await;
    let (_, g) = member_of_group(&engine, "U").await;
    let outsider = common::user(&engine, "O").await;

    let err = engine
        .submit_payment(&outsider.id, &g.id, PaymentMethod::Qpay, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    let err = engine
        .submit_payment(&outsider.id, "missing", PaymentMethod::Qpay, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("Group not found".to_string()));
}

#[tokio::test]
async fn approval_creates_progress_for_the_current_month() {
    let engine = common::engine().await;
    let admin = common::admin(&engine).await;
    let (u, g) = member_of_group(&engine, "U").await;
    let payment = engine
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();

    let approved = engine
        .update_payment_status(&admin.id, &payment.id, PaymentDecision::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, PaymentStatus::Approved);

    let progress = engine.progress_for(&u.id, Some(&g.id)).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].month.to_string(), "2024-06");
    assert!(progress[0].paid);
    assert_eq!(progress[0].note.as_deref(), Some("Approved by admin"));
}

#[tokio::test]
async fn approving_twice_keeps_a_single_progress_row() {
    let engine = common::engine().await;
    let admin = common::admin(&engine).await;
    let (u, g) = member_of_group(&engine, "U").await;
    let payment = engine
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();

    for _ in 0..2 {
        let approved = engine
            .update_payment_status(&admin.id, &payment.id, PaymentDecision::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, PaymentStatus::Approved);
    }
    assert_eq!(engine.progress_for(&u.id, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn approval_updates_an_existing_progress_row() {
    let engine = common::engine().await;
    let admin = common::admin(&engine).await;
    let (u, g) = member_of_group(&engine, "U").await;
    engine
        .submit_payment(&u.id, &g.id, PaymentMethod::Qpay, None)
        .await
        .unwrap();
    let transfer = engine
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();

    engine
        .update_payment_status(&admin.id, &transfer.id, PaymentDecision::Approved)
        .await
        .unwrap();

    let progress = engine.progress_for(&u.id, None).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert!(progress[0].paid);
}

#[tokio::test]
async fn decided_payments_cannot_change_their_mind() {
    let engine = common::engine().await;
    let admin = common::admin(&engine).await;
    let (u, g) = member_of_group(&engine, "U").await;
    let payment = engine
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();
    engine
        .update_payment_status(&admin.id, &payment.id, PaymentDecision::Approved)
        .await
        .unwrap();

    let err = engine
        .update_payment_status(&admin.id, &payment.id, PaymentDecision::Rejected)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition("payment is approved, cannot become rejected".to_string())
    );

    // The month stays paid.
    let progress = engine.progress_for(&u.id, None).await.unwrap();
    assert!(progress[0].paid);
}

#[tokio::test]
async fn rejection_does_not_touch_progress() {
    let engine = common::engine().await;
    let admin = common::admin(&engine).await;
    let (u, g) = member_of_group(&engine, "U").await;
    let payment = engine
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();

    let rejected = engine
        .update_payment_status(&admin.id, &payment.id, PaymentDecision::Rejected)
        .await
        .unwrap();
    assert_eq!(rejected.status, PaymentStatus::Rejected);
    assert!(engine.progress_for(&u.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn reviewing_requires_admin() {
    let engine = common::engine().await;
    let (u, g) = member_of_group(&engine, "U").await;
    let payment = engine
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();

    let err = engine
        .update_payment_status(&u.id, &payment.id, PaymentDecision::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));
    assert!(matches!(
        engine.delete_payment(&u.id, &payment.id).await.unwrap_err(),
        EngineError::PermissionDenied(_)
    ));
    assert!(matches!(
        engine.list_payments(&u.id, None).await.unwrap_err(),
        EngineError::PermissionDenied(_)
    ));
}

#[tokio::test]
async fn approval_uses_the_clock_month_not_the_submission_month() {
    let db = common::memory_db().await;
    let june = common::engine_on(db.clone(), common::at(2024, 6, 30)).await;
    let july = common::engine_on(db, common::at(2024, 7, 1)).await;
    let admin = common::admin(&june).await;
    let (u, g) = member_of_group(&june, "U").await;
    let payment = june
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();

    july.update_payment_status(&admin.id, &payment.id, PaymentDecision::Approved)
        .await
        .unwrap();

    let progress = july.progress_for(&u.id, None).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].month.to_string(), "2024-07");
}

#[tokio::test]
async fn admin_edits_and_deletes_do_not_adjust_progress() {
    let engine = common::engine().await;
    let admin = common::admin(&engine).await;
    let (u, g) = member_of_group(&engine, "U").await;
    let payment = engine
        .submit_payment(&u.id, &g.id, PaymentMethod::Qpay, None)
        .await
        .unwrap();

    let err = engine
        .update_payment_details(
            &admin.id,
            &payment.id,
            PaymentUpdate {
                amount: Some(0),
                note: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed(_)));

    let edited = engine
        .update_payment_details(
            &admin.id,
            &payment.id,
            PaymentUpdate {
                amount: Some(40_000),
                note: Some("partial".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.amount, 40_000);
    assert_eq!(edited.note.as_deref(), Some("partial"));

    engine.delete_payment(&admin.id, &payment.id).await.unwrap();
    assert!(engine.my_payments(&u.id).await.unwrap().is_empty());
    assert_eq!(engine.progress_for(&u.id, None).await.unwrap().len(), 1);

    let err = engine
        .delete_payment(&admin.id, &payment.id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("Payment not found".to_string()));
}

#[tokio::test]
async fn listing_filters_by_status_and_names_the_payer() {
    let engine = common::engine().await;
    let admin = common::admin(&engine).await;
    let (u, g) = member_of_group(&engine, "U").await;
    engine
        .submit_payment(&u.id, &g.id, PaymentMethod::Qpay, None)
        .await
        .unwrap();
    engine
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();

    let all = engine.list_payments(&admin.id, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let pending = engine
        .list_payments(&admin.id, Some(PaymentStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payer_name, "U");
    assert_eq!(pending[0].group_name, "Family");
    assert_eq!(pending[0].payment.method, PaymentMethod::BankTransfer);
}

#[tokio::test]
async fn members_can_self_report_the_month() {
    let engine = common::engine().await;
    let (u, g) = member_of_group(&engine, "U").await;
    let outsider = common::user(&engine, "O").await;

    let row = engine.mark_as_paid(&u.id, &g.id, None).await.unwrap();
    assert!(row.paid);
    assert_eq!(row.month.to_string(), "2024-06");

    let again = engine.mark_as_paid(&u.id, &g.id, Some("cash")).await.unwrap();
    assert_eq!(again.id, row.id);

    assert!(matches!(
        engine.mark_as_paid(&outsider.id, &g.id, None).await.unwrap_err(),
        EngineError::PermissionDenied(_)
    ));
}

#[tokio::test]
async fn dashboard_and_overview_reflect_payments() {
    let engine = common::engine().await;
    let admin = common::admin(&engine).await;
    let (u, g) = member_of_group(&engine, "U").await;
    engine
        .submit_payment(&u.id, &g.id, PaymentMethod::Qpay, None)
        .await
        .unwrap();
    engine
        .submit_payment(&u.id, &g.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();

    let dashboard = engine.dashboard(&u.id).await.unwrap();
    assert_eq!(dashboard.month.to_string(), "2024-06");
    assert_eq!(dashboard.groups.len(), 1);
    assert_eq!(dashboard.groups[0].rotation_order, 1);
    assert!(dashboard.groups[0].paid_this_month);

    let overview = engine.overview(&admin.id).await.unwrap();
    assert_eq!(overview.users, 2);
    assert_eq!(overview.groups, 1);
    assert_eq!(overview.settled_revenue, 50_000);
    assert_eq!(overview.pending_payments, 1);

    assert!(matches!(
        engine.overview(&u.id).await.unwrap_err(),
        EngineError::PermissionDenied(_)
    ));
}
