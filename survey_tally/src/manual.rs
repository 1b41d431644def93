/*!

This is the long-form manual for `survey_tally` and `surveyrep`.

## Input format

The export is a table where:
* the first row holds the column labels,
* the first two columns identify the respondent,
* each following row is one respondent,
* the **last** row holds the precomputed totals of every counted column.

CSV exports use `;` as separator. They are read as UTF-8 and, when that fails,
as Windows-1252 (a superset of Latin-1). Excel files (`.xlsx`) are also
accepted with `--input-type xlsx`.

### Column labels

Labels follow the `<Item>.<Modality>` convention. The split happens on the
**last** `.` of the label:

| label | item | modality |
|-------|------|----------|
| `Accueil.Très satisfait` | `Accueil` | `Très satisfait` |
| `Q1. Horaires.Oui` | `Q1. Horaires` | `Oui` |
| `Accueil.Commentaire` | `Accueil` | comment column |
| `Repas` | `Repas` | empty modality |

A modality containing `commentaire` (any case) marks a free-text column.
All the other columns of an item are counted.

### Counts and percentages

Counts are read from the totals row only. A cell that is not a non-negative
whole number counts as zero: `N/A`, `12.5` and negative counts such as `-3`
are all read as zero, while `12.0` is read as 12. Very large totals saturate
instead of overflowing. Percentages are rounded to one decimal place.
An item whose counts sum to zero has no breakdown: it is still reported, with
a "no total available" notice. A missing total and a total where every cell
is unreadable cannot be told apart.

### Ordered scales

When the set of modalities of an item is exactly the set of labels of a
configured scale, the modalities are displayed in the order of the scale and
drawn with its colors. The default scale is:

| label | color |
|-------|-------|
| Très satisfait | `#1b7837` |
| Satisfait | `#5aae61` |
| Peu satisfait | `#80cdc1` |
| Pas du tout satisfait | `#f46d43` |

### Open questions

Open questions are read by position in the **full** table (by default columns
`BO`, `BQ` and `BS`). Positions beyond the last column are ignored.

## Configuration

All the positions above can be changed with a JSON file passed with
`--config`:

```json
{
  "outputSettings": {
    "reportTitle": "Enquête à chaud",
    "outputDirectory": "out"
  },
  "layout": {
    "identifierColumns": 2,
    "firstResponseColumn": "C",
    "lastResponseColumn": "AZ",
    "openQuestionColumns": ["BO", "BQ", "BS"]
  },
  "scales": [
    {
      "name": "yes_no",
      "labels": ["Oui", "Non"],
      "colors": ["#1b7837", "#f46d43"]
    }
  ]
}
```

Columns are given either as 1-based numbers or as Excel letters.
When `scales` is given, it replaces the default scale.

## Outputs

`surveyrep` writes three files into the output directory:
* `enquete_a_chaud_rapport.html` the interactive report,
* `enquete_a_chaud_rapport.pptx` the slide deck,
* `enquete_a_chaud_summary.json` the summary, which can be checked against a
  reference with `--reference`.

*/
