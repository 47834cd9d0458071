//! Course content: the landing overview and the five day views.

use serde::Serialize;

pub const DAY_COUNT: u8 = 5;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub time_estimate: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CourseDay {
    pub day: u8,
    pub title: String,
    pub description: String,
    pub content: Vec<String>,
    pub tasks: Vec<Task>,
    pub result: String,
    pub template: Option<String>,
    pub prev_day: Option<u8>,
    pub next_day: Option<u8>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub title: String,
    pub description: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub day: u8,
    pub title: String,
    pub description: String,
    pub result: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    pub title: String,
    pub tagline: String,
    pub features: Vec<Feature>,
    pub days: Vec<DaySummary>,
}

struct DaySource {
    title: &'static str,
    description: &'static str,
    content: &'static [&'static str],
    // (title, description, time estimate)
    tasks: &'static [(&'static str, &'static str, &'static str)],
    result: &'static str,
    template: Option<&'static str>,
}

const DAYS: [DaySource; DAY_COUNT as usize] = [
    DaySource {
        title: "Аудит процессов",
        description: "Находим узкие места и определяем приоритеты",
        content: &[
            "Прежде чем что-то автоматизировать, нужно увидеть, как бизнес работает сейчас.",
            "Выпишите все повторяющиеся действия за неделю и отметьте, какие из них съедают больше всего времени.",
        ],
        tasks: &[
            ("Список процессов", "Перечислите все регулярные процессы бизнеса", "30 минут"),
            ("Оценка затрат", "Оцените время, которое уходит на каждый процесс", "20 минут"),
            ("Выбор приоритета", "Выберите один процесс для упорядочивания", "10 минут"),
        ],
        result: "План упорядочивания ключевого процесса",
        template: Some("Шаблон аудита процессов"),
    },
    DaySource {
        title: "Построение процесса",
        description: "Создаем четкую схему основного рабочего цикла",
        content: &[
            "Процесс, который существует только в голове, невозможно передать.",
            "Опишите шаги выбранного процесса от входа до результата и зафиксируйте ответственных.",
        ],
        tasks: &[
            ("Схема процесса", "Нарисуйте шаги процесса от начала до конца", "40 минут"),
            ("Роли", "Назначьте ответственного за каждый шаг", "15 минут"),
            ("Точки контроля", "Отметьте, где проверяется качество результата", "15 минут"),
        ],
        result: "Готовая схема бизнес-процесса",
        template: Some("Шаблон схемы процесса"),
    },
    DaySource {
        title: "Делегирование и автоматизация",
        description: "Инструменты для передачи задач и автоматизации",
        content: &[
            "Всё, что повторяется, можно либо передать человеку, либо отдать сервису.",
            "Разделите шаги процесса на три группы: делаю сам, делегирую, автоматизирую.",
        ],
        tasks: &[
            ("Разметка шагов", "Распределите шаги процесса по трем группам", "20 минут"),
            ("Инструкция", "Напишите инструкцию для одного делегируемого шага", "40 минут"),
            ("Первая автоматизация", "Настройте один автоматический сценарий", "30 минут"),
        ],
        result: "План делегирования повторяющихся задач",
        template: None,
    },
    DaySource {
        title: "Контроль и метрики",
        description: "Простая аналитика и показатели эффективности",
        content: &[
            "Система без измерений быстро превращается обратно в хаос.",
            "Выберите несколько показателей, которые честно отражают работу процесса, и договоритесь о ритме проверки.",
        ],
        tasks: &[
            ("Ключевые показатели", "Выберите три метрики для процесса", "20 минут"),
            ("Чек-лист", "Составьте чек-лист еженедельной проверки", "20 минут"),
        ],
        result: "Чек-лист и метрики для отслеживания",
        template: Some("Шаблон панели метрик"),
    },
    DaySource {
        title: "Дорожная карта",
        description: "План внедрения систем и развития бизнеса",
        content: &[
            "Один упорядоченный процесс — это начало, а не финал.",
            "Соберите результаты всех дней в план на ближайшие три месяца.",
        ],
        tasks: &[
            ("Следующие процессы", "Выберите процессы для следующих итераций", "20 минут"),
            ("Календарь внедрения", "Распределите внедрение по неделям", "30 минут"),
            ("Итоги курса", "Запишите главные выводы за пять дней", "15 минут"),
        ],
        result: "Стратегия системного развития",
        template: None,
    },
];

fn build(day: u8, src: &DaySource) -> CourseDay {
    CourseDay {
        day,
        title: src.title.into(),
        description: src.description.into(),
        content: src.content.iter().map(|p| p.to_string()).collect(),
        tasks: src
            .tasks
            .iter()
            .enumerate()
            .map(|(i, (title, description, time))| Task {
                id: format!("day{day}-task{}", i + 1),
                title: title.to_string(),
                description: description.to_string(),
                time_estimate: time.to_string(),
            })
            .collect(),
        result: src.result.into(),
        template: src.template.map(String::from),
        prev_day: (day > 1).then(|| day - 1),
        next_day: (day < DAY_COUNT).then(|| day + 1),
    }
}

/// Day `n` of the course, 1-based.
pub fn day(n: u8) -> Option<CourseDay> {
    let idx = usize::from(n).checked_sub(1)?;
    DAYS.get(idx).map(|src| build(n, src))
}

pub fn overview() -> Overview {
    Overview {
        title: "Бизнес на автопилоте: системный старт".into(),
        tagline: "Превратите хаос в эффективную систему за 5 дней".into(),
        features: [
            ("Конкретные результаты", "Готовый план систематизации уже через 3 дня"),
            ("5 дней — 5 систем", "Каждый день — новый процесс под контроль"),
            ("Для инфопредпринимателей", "Специально для тех, кто уже зарабатывает, но устал от хаоса"),
        ]
        .into_iter()
        .map(|(title, description)| Feature {
            title: title.into(),
            description: description.into(),
        })
        .collect(),
        days: (1..=DAY_COUNT)
            .filter_map(day)
            .map(|d| DaySummary {
                day: d.day,
                title: d.title,
                description: d.description,
                result: d.result,
            })
            .collect(),
    }
}
