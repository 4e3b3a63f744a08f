mod common;

use std::sync::Arc;

use common::{FakeApi, quiz};
use services::{
    CheckpointService, Clock, QuizError, QuizPhase, QuizService, QuizSession, QuizStart, QuizTick,
};
use storage::repository::{CheckpointRepository, InMemoryRepository};
use study_core::TickOutcome;
use study_core::model::{CheckpointKey, ChoiceId, QuestionId, QuizCheckpoint, QuizId};
use study_core::time::fixed_now;

fn key() -> CheckpointKey {
    CheckpointKey::Quiz(QuizId::new(3))
}

fn setup(api: FakeApi) -> (QuizService, Arc<FakeApi>, Arc<InMemoryRepository>) {
    let api = Arc::new(api);
    let repo = Arc::new(InMemoryRepository::new());
    let clock = Clock::fixed(fixed_now());
    let checkpoints = CheckpointService::new(clock, repo.clone());
    (QuizService::new(clock, api.clone(), checkpoints), api, repo)
}

async fn ready(service: &QuizService) -> QuizSession {
    match service.open(QuizId::new(3)).await.unwrap() {
        QuizStart::Ready { session, .. } => session,
        QuizStart::Empty => panic!("expected questions"),
    }
}

#[tokio::test]
async fn countdown_submits_exactly_once() {
    let (service, api, _repo) = setup(FakeApi::with_quiz(quiz(3, 5, 2)));
    let mut session = ready(&service).await;

    let mut submitted = 0;
    for _ in 0..5 {
        if service.on_tick(&mut session).await.unwrap().is_submitted() {
            submitted += 1;
        }
    }
    assert_eq!(submitted, 1);

    for _ in 0..3 {
        assert_eq!(service.on_tick(&mut session).await.unwrap(), QuizTick::Stopped);
    }
    assert_eq!(api.submissions().len(), 1);
    assert_eq!(api.submissions()[0].time_taken_secs, 5);
    assert!(matches!(session.phase(), QuizPhase::Results(_)));
}

#[tokio::test]
async fn last_answer_wins_in_submission() {
    let (service, api, _repo) = setup(FakeApi::with_quiz(quiz(3, 60, 3)));
    let mut session = ready(&service).await;

    service
        .select(&mut session, QuestionId::new(1), ChoiceId::new(10))
        .await
        .unwrap();
    service
        .select(&mut session, QuestionId::new(1), ChoiceId::new(11))
        .await
        .unwrap();
    service.submit(&mut session).await.unwrap();

    let submission = &api.submissions()[0];
    assert_eq!(submission.answers.len(), 1);
    assert_eq!(submission.answers[0].question_id, QuestionId::new(1));
    assert_eq!(submission.answers[0].choice_id, ChoiceId::new(11));
}

#[tokio::test]
async fn time_taken_is_limit_minus_remaining() {
    let (service, api, _repo) = setup(FakeApi::with_quiz(quiz(3, 60, 2)));
    let mut session = ready(&service).await;

    for _ in 0..17 {
        service.on_tick(&mut session).await.unwrap();
    }
    let remaining = session.remaining_secs();
    assert_eq!(remaining, 43);
    assert_eq!(session.clock_label(), "0:43");

    let result = service.submit(&mut session).await.unwrap();
    assert_eq!(api.submissions()[0].time_taken_secs, 60 - remaining);
    assert_eq!(result.incorrect_answers(), 4);
}

#[tokio::test]
async fn failed_submission_keeps_the_attempt() {
    let api = FakeApi::with_quiz(quiz(3, 60, 2));
    FakeApi::set(&api.fail_submit, true);
    let (service, api, _repo) = setup(api);
    let mut session = ready(&service).await;
    service.select_at(&mut session, 1).await.unwrap();

    let err = service.submit(&mut session).await.unwrap_err();
    assert!(matches!(err, QuizError::Submit(_)));
    assert!(session.is_in_progress());
    assert_eq!(session.answer_for(QuestionId::new(1)), Some(ChoiceId::new(11)));

    FakeApi::set(&api.fail_submit, false);
    service.submit(&mut session).await.unwrap();
    assert_eq!(api.submissions().len(), 1);
}

#[tokio::test]
async fn failed_auto_submission_is_not_retried() {
    let api = FakeApi::with_quiz(quiz(3, 2, 1));
    FakeApi::set(&api.fail_submit, true);
    let (service, api, _repo) = setup(api);
    let mut session = ready(&service).await;

    assert_eq!(
        service.on_tick(&mut session).await.unwrap(),
        QuizTick::Running { remaining: 1 }
    );
    assert!(matches!(
        service.on_tick(&mut session).await,
        Err(QuizError::Submit(_))
    ));
    assert_eq!(service.on_tick(&mut session).await.unwrap(), QuizTick::Stopped);
    assert!(session.is_in_progress());
    assert!(api.submissions().is_empty());
}

#[tokio::test]
async fn empty_quiz_and_fetch_failure() {
    let (service, _api, repo) = setup(FakeApi::with_quiz(quiz(3, 60, 0)));
    assert!(matches!(
        service.open(QuizId::new(3)).await.unwrap(),
        QuizStart::Empty
    ));

    let (service, _api, _) = setup(FakeApi::default());
    assert!(matches!(
        service.open(QuizId::new(3)).await,
        Err(QuizError::Fetch(_))
    ));
    assert!(repo.list_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn interrupted_attempt_resumes_with_answers_and_time() {
    let (service, _api, repo) = setup(FakeApi::with_quiz(quiz(3, 60, 3)));
    let mut session = ready(&service).await;
    service.select_at(&mut session, 0).await.unwrap();
    service.next(&mut session).await.unwrap();
    for _ in 0..12 {
        service.on_tick(&mut session).await.unwrap();
    }
    service.suspend(&session).await;
    drop(session);

    let saved = repo.load(key()).await.unwrap().expect("checkpoint saved");
    let cp: QuizCheckpoint = serde_json::from_str(&saved.payload).unwrap();
    assert_eq!(cp.remaining_secs, 48);

    let QuizStart::Ready { session, resumed } = service.open(QuizId::new(3)).await.unwrap() else {
        panic!("expected questions");
    };
    assert!(resumed);
    assert_eq!(session.current_index(), 1);
    assert_eq!(session.remaining_secs(), 48);
    assert_eq!(session.answer_for(QuestionId::new(1)), Some(ChoiceId::new(10)));
}

#[tokio::test]
async fn results_clear_the_checkpoint_and_retake_resets() {
    let (service, _api, repo) = setup(FakeApi::with_quiz(quiz(3, 60, 2)));
    let mut session = ready(&service).await;
    service.select_at(&mut session, 0).await.unwrap();
    assert!(repo.load(key()).await.unwrap().is_some());

    service.submit(&mut session).await.unwrap();
    assert!(repo.load(key()).await.unwrap().is_none());
    assert!(matches!(
        service.submit(&mut session).await,
        Err(QuizError::NotInProgress)
    ));

    service.retake(&mut session);
    assert!(session.is_in_progress());
    assert_eq!(session.answered_count(), 0);
    assert_eq!(session.remaining_secs(), 60);
    assert_eq!(session.tick(), TickOutcome::Running { remaining: 59 });
}

#[tokio::test]
async fn close_hands_results_to_the_callback() {
    let (service, _api, repo) = setup(FakeApi::with_quiz(quiz(3, 60, 2)));
    let mut session = ready(&service).await;
    service.select_at(&mut session, 1).await.unwrap();
    let result = service.submit(&mut session).await.unwrap();

    let mut seen = None;
    service
        .close(session, |r| seen = Some(r.clone()))
        .await;
    assert_eq!(seen, Some(result));

    let unfinished = ready(&service).await;
    let mut called = false;
    service.close(unfinished, |_| called = true).await;
    assert!(!called);
    assert!(repo.load(key()).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn timer_drives_the_attempt_to_submission() {
    let (service, api, _repo) = setup(FakeApi::with_quiz(quiz(3, 3, 1)));
    let mut session = ready(&service).await;
    let mut timer = service.start_timer(&session);

    let mut ticks = 0;
    while let Some(_event) = timer.recv().await {
        ticks += 1;
        if let QuizTick::Submitted(result) = service.on_tick(&mut session).await.unwrap() {
            assert_eq!(result.total_questions, 4);
        }
    }
    assert_eq!(ticks, 3);
    assert_eq!(api.submissions().len(), 1);
    assert_eq!(api.submissions()[0].time_taken_secs, 3);
}
