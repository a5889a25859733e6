//! Защита от устаревших ответов асинхронных запросов.
//!
//! Каждый запрос (геокодирование, подбор маршрута, поиск клиентов/товаров)
//! получает билет с ключом, по которому он был отправлен. Ответ применяется
//! только если его билет всё ещё последний для своего канала: более ранний
//! запрос, ответивший позже, отбрасывается.

/// Билет на один выпущенный запрос
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket<K> {
    pub key: K,
    pub seq: u64,
}

/// Последний выпущенный запрос канала
#[derive(Debug, Clone, Default)]
pub struct LatestRequest<K> {
    seq: u64,
    current: Option<RequestTicket<K>>,
}

impl<K: Clone + PartialEq> LatestRequest<K> {
    pub fn new() -> Self {
        Self {
            seq: 0,
            current: None,
        }
    }

    /// Выпустить новый билет; все предыдущие становятся устаревшими
    pub fn issue(&mut self, key: K) -> RequestTicket<K> {
        self.seq += 1;
        let ticket = RequestTicket { key, seq: self.seq };
        self.current = Some(ticket.clone());
        ticket
    }

    /// Ответ по билету можно применять
    pub fn is_current(&self, ticket: &RequestTicket<K>) -> bool {
        self.current.as_ref() == Some(ticket)
    }

    /// Принять ответ: билет закрывается, повторное применение невозможно
    pub fn accept(&mut self, ticket: &RequestTicket<K>) -> bool {
        if self.is_current(ticket) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// Отменить ожидание (например, адрес очищен)
    pub fn cancel(&mut self) {
        self.current = None;
    }

    pub fn pending_key(&self) -> Option<&K> {
        self.current.as_ref().map(|t| &t.key)
    }
}
